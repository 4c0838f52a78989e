use super::adapter::chat_line;

#[test]
fn test_chat_line_carries_author_prefix() {
    assert_eq!(chat_line("alice", "hi"), "alice: hi");
}

#[test]
fn test_chat_line_keeps_text_verbatim() {
    // no trimming or escaping; the hub stores lines as submitted
    assert_eq!(chat_line("bob", "  spaced  "), "bob:   spaced  ");
    assert_eq!(chat_line("bob", ""), "bob: ");
}
