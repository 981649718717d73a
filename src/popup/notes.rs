/// Ordered collection of freeform notes taken during a session. Notes are
/// append-only; duplicates are allowed and order is preserved.
#[derive(Debug, Default)]
pub struct NoteCollector {
    notes: Vec<String>,
}

impl NoteCollector {
    /// Trims and appends a note. Whitespace-only input is dropped silently.
    /// Returns whether the note was kept.
    pub fn append(&mut self, text: &str) -> bool {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return false;
        }
        self.notes.push(trimmed.to_string());
        true
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    /// Copy of the notes in append order, used to build a report payload
    /// without consuming state that must survive a failed submission.
    pub fn snapshot(&self) -> Vec<String> {
        self.notes.clone()
    }

    pub fn clear(&mut self) {
        self.notes.clear();
    }
}

#[cfg(test)]
mod note_tests {
    use super::NoteCollector;

    #[test]
    fn blank_input_is_ignored() {
        let mut notes = NoteCollector::default();
        assert!(!notes.append(""));
        assert!(!notes.append("   "));
        assert!(notes.is_empty());
    }

    #[test]
    fn notes_are_trimmed_and_ordered() {
        let mut notes = NoteCollector::default();
        assert!(notes.append(" buy milk "));
        assert!(notes.append("buy milk"));
        assert_eq!(notes.snapshot(), vec!["buy milk", "buy milk"]);
        assert_eq!(notes.len(), 2);
    }
}
