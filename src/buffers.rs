//! The buffer bank: the fixed-size mutable text register file the evaluator
//! reads and writes.

/// Number of addressable slots, plus the unused slot 0.
const SLOT_COUNT: usize = 21;

/// Slot 1: the primary input document.
pub const INPUT: u8 = 1;
/// Slot 2: the item identifier.
pub const ITEM_ID: u8 = 2;
/// Slot 3: the source locator (URL or path).
pub const SOURCE: u8 = 3;

/// Returns whether `index` is a valid buffer index (`1..=20`).
#[must_use]
pub fn is_valid_index(index: u8) -> bool {
    (1..=20).contains(&index)
}

/// The 21-slot string register file indexed `1..=20` (slot 0 is unused).
///
/// Every top-level invocation owns its own `Buffers`; nothing here is
/// process-wide state.
#[derive(Debug, Clone)]
pub struct Buffers {
    slots: [Option<String>; SLOT_COUNT],
}

impl Default for Buffers {
    fn default() -> Self {
        Self::new()
    }
}

impl Buffers {
    /// Creates a bank with every slot absent.
    #[must_use]
    pub fn new() -> Self {
        Self {
            slots: core::array::from_fn(|_| None),
        }
    }

    /// Creates a bank for a top-level invocation: `B[1]` is the input
    /// document, `B[2]` the item identifier, `B[3]` the source locator.
    #[must_use]
    pub fn for_input(input: impl Into<String>, item_id: impl Into<String>, source: impl Into<String>) -> Self {
        let mut buffers = Self::new();
        buffers.set(INPUT, input);
        buffers.set(ITEM_ID, item_id);
        buffers.set(SOURCE, source);
        buffers
    }

    /// Creates a bank for a chained invocation: `B[1]` and `B[2]` both hold
    /// the chain element's text, `B[3]` is inherited from the caller.
    #[must_use]
    pub fn for_chain(text: impl Into<String>, source: Option<&str>) -> Self {
        let mut buffers = Self::new();
        let text = text.into();
        buffers.set(ITEM_ID, text.clone());
        buffers.set(INPUT, text);
        if let Some(source) = source {
            buffers.set(SOURCE, source.to_string());
        }
        buffers
    }

    /// Reads slot `index`, or `None` if it is absent.
    #[must_use]
    pub fn get(&self, index: u8) -> Option<&str> {
        debug_assert!(is_valid_index(index), "buffer index {index} out of range");
        self.slots[index as usize].as_deref()
    }

    /// Reads slot `index`, or `""` if it is absent.
    #[must_use]
    pub fn get_or_empty(&self, index: u8) -> &str {
        self.get(index).unwrap_or("")
    }

    /// Unconditionally sets slot `index` to `value`.
    pub fn set(&mut self, index: u8, value: impl Into<String>) {
        debug_assert!(is_valid_index(index), "buffer index {index} out of range");
        self.slots[index as usize] = Some(value.into());
    }

    /// Resets slot `index` to the empty string.
    pub fn clear(&mut self, index: u8) {
        self.set(index, String::new());
    }

    /// Appends `text` to slot `index`, initializing it to `""` first if it
    /// was absent. A no-op if `text` is empty.
    pub fn append(&mut self, index: u8, text: &str) {
        debug_assert!(is_valid_index(index), "buffer index {index} out of range");
        let slot = &mut self.slots[index as usize];
        if slot.is_none() {
            *slot = Some(String::new());
        }
        if !text.is_empty() {
            slot.as_mut().expect("just initialized above").push_str(text);
        }
    }

    /// Resets every slot except `B[1]`, `B[2]`, `B[3]` to absent.
    pub fn reset_preserving_input(&mut self) {
        for slot in &mut self.slots[4..] {
            *slot = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clearbuffers_preserves_input_identifier_and_source() {
        let mut buffers = Buffers::for_input("doc", "id", "src");
        buffers.set(5, "stale");
        buffers.reset_preserving_input();
        assert_eq!(buffers.get(1), Some("doc"));
        assert_eq!(buffers.get(2), Some("id"));
        assert_eq!(buffers.get(3), Some("src"));
        assert_eq!(buffers.get(5), None);
    }

    #[test]
    fn append_initializes_absent_slot_then_appends() {
        let mut buffers = Buffers::new();
        buffers.append(7, "Alpha");
        buffers.append(7, "Beta");
        assert_eq!(buffers.get(7), Some("AlphaBeta"));
    }

    #[test]
    fn append_of_empty_text_is_a_no_op() {
        let mut buffers = Buffers::new();
        buffers.set(7, "kept");
        buffers.append(7, "");
        assert_eq!(buffers.get(7), Some("kept"));
    }

    #[test]
    fn for_chain_shares_text_between_input_and_item_id() {
        let buffers = Buffers::for_chain("cast-html", Some("https://example.test/"));
        assert_eq!(buffers.get(1), Some("cast-html"));
        assert_eq!(buffers.get(2), Some("cast-html"));
        assert_eq!(buffers.get(3), Some("https://example.test/"));
    }
}
