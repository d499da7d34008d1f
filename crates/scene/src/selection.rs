/// Visual emphasis of a marker, strongest wins.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Emphasis {
    Idle,
    Hovered,
    Selected,
}

/// Per-point interaction flags. `selected` and `hovered` are independent.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct MarkerVisualState {
    pub selected: bool,
    pub hovered: bool,
}

impl MarkerVisualState {
    pub fn emphasis(self) -> Emphasis {
        if self.selected {
            Emphasis::Selected
        } else if self.hovered {
            Emphasis::Hovered
        } else {
            Emphasis::Idle
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SelectOutcome {
    Changed { previous: Option<usize> },
    /// The point was already selected; state is untouched.
    Reconfirmed,
}

/// Selection and hover over catalog indices.
///
/// At most one point is selected and at most one is hovered. Membership is
/// tracked by catalog index; resolving ids is the caller's job.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    selected: Option<usize>,
    hovered: Option<usize>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_selected(index: usize) -> Self {
        Self {
            selected: Some(index),
            hovered: None,
        }
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn hovered(&self) -> Option<usize> {
        self.hovered
    }

    pub fn select(&mut self, index: usize) -> SelectOutcome {
        if self.selected == Some(index) {
            return SelectOutcome::Reconfirmed;
        }
        let previous = self.selected.replace(index);
        SelectOutcome::Changed { previous }
    }

    /// Sets or clears the hovered point. Returns `true` if it changed.
    pub fn hover(&mut self, index: Option<usize>) -> bool {
        if self.hovered == index {
            return false;
        }
        self.hovered = index;
        true
    }

    /// The point in focus for highlight and label purposes: hover wins over selection.
    pub fn active(&self) -> Option<usize> {
        self.hovered.or(self.selected)
    }

    pub fn visual_state(&self, index: usize) -> MarkerVisualState {
        MarkerVisualState {
            selected: self.selected == Some(index),
            hovered: self.hovered == Some(index),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Emphasis, MarkerVisualState, SelectOutcome, Selection};

    #[test]
    fn select_is_idempotent() {
        let mut s = Selection::new();
        assert_eq!(s.select(1), SelectOutcome::Changed { previous: None });
        assert_eq!(s.select(1), SelectOutcome::Reconfirmed);
        assert_eq!(s.select(2), SelectOutcome::Changed { previous: Some(1) });
        assert_eq!(s.selected(), Some(2));
    }

    #[test]
    fn hover_takes_precedence_for_active() {
        let mut s = Selection::with_selected(1);
        assert_eq!(s.active(), Some(1));
        assert!(s.hover(Some(2)));
        assert!(!s.hover(Some(2)));
        assert_eq!(s.active(), Some(2));
        assert!(s.hover(None));
        assert_eq!(s.active(), Some(1));
    }

    #[test]
    fn selected_and_hovered_are_independent() {
        let mut s = Selection::with_selected(0);
        s.hover(Some(0));
        let v = s.visual_state(0);
        assert!(v.selected && v.hovered);
        assert_eq!(v.emphasis(), Emphasis::Selected);
        assert_eq!(s.visual_state(1), MarkerVisualState::default());
        assert_eq!(s.visual_state(1).emphasis(), Emphasis::Idle);
        assert!(Emphasis::Selected > Emphasis::Hovered && Emphasis::Hovered > Emphasis::Idle);
    }
}
