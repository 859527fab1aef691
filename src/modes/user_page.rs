//! User page toggle set

/// Held state of the user-page buttons
///
/// The effective page is the highest held button (1-based), or 0 when none is
/// held, which tolerates overlapping press/release sequences from hardware.
#[derive(Debug, Clone)]
pub struct UserPageSet {
    held: Vec<bool>,
    current: u8,
}

impl UserPageSet {
    pub fn new(max_user_pages: usize) -> Self {
        Self {
            held: vec![false; max_user_pages],
            current: 0,
        }
    }

    pub fn current(&self) -> u8 {
        self.current
    }

    pub fn max_pages(&self) -> usize {
        self.held.len()
    }

    pub fn is_held(&self, index: usize) -> bool {
        self.held.get(index).copied().unwrap_or(false)
    }

    /// Update one button; returns the new effective page if it changed
    pub fn set_held(&mut self, index: usize, held: bool) -> Option<u8> {
        let slot = self.held.get_mut(index)?;
        *slot = held;

        let page = self
            .held
            .iter()
            .rposition(|&h| h)
            .map(|i| (i + 1) as u8)
            .unwrap_or(0);

        if page == self.current {
            return None;
        }
        self.current = page;
        Some(page)
    }
}
