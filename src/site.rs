//! Subjects served by the site and the feature pages each one offers.

/// A top-level content area.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Subject {
    /// URL segment and translation key (e.g., "probabilidade")
    pub id: &'static str,

    /// Feature pages reachable at `/<id>/<feature>`
    pub features: &'static [&'static str],
}

impl Subject {
    pub fn has_feature(&self, feature: &str) -> bool {
        self.features.contains(&feature)
    }
}

/// Translation page key used for a subject's landing page.
pub const SUBJECT_INDEX_PAGE: &str = "index";

pub const SUBJECTS: &[Subject] = &[
    Subject {
        id: "probabilidade",
        features: &["calculator", "quiz", "podcasts", "descobrir"],
    },
    Subject {
        id: "analise_estatistica",
        features: &["quiz"],
    },
];

/// Look up a registered subject.
pub fn find_subject(id: &str) -> Option<&'static Subject> {
    SUBJECTS.iter().find(|subject| subject.id == id)
}
