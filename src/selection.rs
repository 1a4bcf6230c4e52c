use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// ActiveSelection – the single highlighted major across linked charts
// ---------------------------------------------------------------------------

/// Cross-chart selection. Owned by whoever drives the UI; views only read it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "state", content = "major")]
pub enum ActiveSelection {
    #[default]
    Unselected,
    Selected(String),
}

/// User gestures on the line chart that move the selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Interaction {
    Hover(String),
    Click(String),
    Deselect,
}

impl ActiveSelection {
    /// Next state after a gesture. Selecting replaces any previous major.
    pub fn apply(self, interaction: Interaction) -> Self {
        match interaction {
            Interaction::Hover(major) | Interaction::Click(major) => ActiveSelection::Selected(major),
            Interaction::Deselect => ActiveSelection::Unselected,
        }
    }

    pub fn select(&mut self, major: impl Into<String>) {
        *self = ActiveSelection::Selected(major.into());
    }

    pub fn clear(&mut self) {
        *self = ActiveSelection::Unselected;
    }

    pub fn major(&self) -> Option<&str> {
        match self {
            ActiveSelection::Selected(m) => Some(m),
            ActiveSelection::Unselected => None,
        }
    }

    pub fn is_selected(&self) -> bool {
        matches!(self, ActiveSelection::Selected(_))
    }

    /// Whether `major` stays visible in views filtered by this selection.
    pub fn admits(&self, major: &str) -> bool {
        match self {
            ActiveSelection::Unselected => true,
            ActiveSelection::Selected(m) => m == major,
        }
    }

    /// Whether `major` is drawn emphasized (not dimmed).
    pub fn emphasizes(&self, major: &str) -> bool {
        self.admits(major)
    }

    /// Keep the items whose major is admitted.
    pub fn restrict<'a, T>(&self, items: &[&'a T], major_of: impl Fn(&T) -> &str) -> Vec<&'a T> {
        items
            .iter()
            .copied()
            .filter(|item| self.admits(major_of(item)))
            .collect()
    }
}
