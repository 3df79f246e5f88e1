use crate::code::{Code, PLACEHOLDER};

/// Single slot holding the generated code awaiting insertion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PendingCode {
    slot: Option<Code>,
}

impl PendingCode {
    pub fn get(&self) -> Option<Code> {
        self.slot
    }

    pub fn is_some(&self) -> bool {
        self.slot.is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.slot.is_none()
    }

    /// Stores `code`, returning the value it displaced.
    pub fn replace(&mut self, code: Code) -> Option<Code> {
        self.slot.replace(code)
    }

    pub fn take(&mut self) -> Option<Code> {
        self.slot.take()
    }

    /// Text for the display field.
    pub fn display_text(&self) -> String {
        self.slot
            .map_or_else(|| PLACEHOLDER.to_string(), |code| code.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_falls_back_to_placeholder() {
        let mut pending = PendingCode::default();
        assert_eq!(pending.display_text(), "fc-000-000");

        let code = Code::new(321, 654).unwrap();
        assert_eq!(pending.replace(code), None);
        assert_eq!(pending.display_text(), "fc-321-654");

        assert_eq!(pending.take(), Some(code));
        assert!(pending.is_empty());
    }
}
