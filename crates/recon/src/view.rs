use serde::{Deserialize, Serialize};

use crate::model::{DetailStatus, ReconDetail, ReconResult};

/// Filtered views over a result's details.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultView {
    #[default]
    All,
    Mismatches,
    OnlyFirst,
    OnlySecond,
    Ambiguous,
}

impl ResultView {
    pub const ALL: [ResultView; 5] = [
        ResultView::All,
        ResultView::Mismatches,
        ResultView::OnlyFirst,
        ResultView::OnlySecond,
        ResultView::Ambiguous,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ResultView::All => "all",
            ResultView::Mismatches => "mismatches",
            ResultView::OnlyFirst => "only_first",
            ResultView::OnlySecond => "only_second",
            ResultView::Ambiguous => "ambiguous",
        }
    }

    pub fn includes(&self, detail: &ReconDetail) -> bool {
        match self {
            ResultView::All => true,
            ResultView::Mismatches => {
                detail.in_first_file
                    && detail.in_second_file
                    && !detail.is_match
                    && detail.status != DetailStatus::Ambiguous
            }
            ResultView::OnlyFirst => detail.in_first_file && !detail.in_second_file,
            ResultView::OnlySecond => !detail.in_first_file && detail.in_second_file,
            ResultView::Ambiguous => detail.status == DetailStatus::Ambiguous,
        }
    }
}

impl std::fmt::Display for ResultView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ReconResult {
    pub fn view(&self, view: ResultView) -> impl Iterator<Item = &ReconDetail> + '_ {
        self.details.iter().filter(move |d| view.includes(d))
    }
}
