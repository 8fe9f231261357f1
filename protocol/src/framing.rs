//! Line framing for the TCP transport
//!
//! A request goes on the wire as its raw bytes followed by one terminator
//! byte; the answer is everything up to and including the terminator.

/// End-of-message marker on the TCP byte stream
pub const TERMINATOR: u8 = b'\n';

/// Separator after the status code of a digit-prefixed answer
pub const STATUS_SEPARATOR: u8 = b'\t';

/// True once a growing answer ends with the protocol terminator
pub fn is_complete(answer: &[u8]) -> bool {
    answer.last() == Some(&TERMINATOR)
}

/// Finalize a terminator-delimited answer for delivery.
///
/// When the answer opens with a decimal digit it carries a leading status
/// code; the last status separator in the whole answer is rewritten to a
/// newline. The trailing terminator is stripped and never reaches the
/// caller.
pub fn finish_answer(mut answer: Vec<u8>) -> Vec<u8> {
    if answer.first().is_some_and(u8::is_ascii_digit) {
        if let Some(position) = answer.iter().rposition(|&byte| byte == STATUS_SEPARATOR) {
            answer[position] = TERMINATOR;
        }
    }
    if is_complete(&answer) {
        answer.pop();
    }
    answer
}
