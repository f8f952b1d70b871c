/// Joins names the way they are spoken: "a", "a and b", "a, b and c".
pub fn join_natural<S: AsRef<str>>(items: &[S]) -> String {
    match items {
        [] => String::new(),
        [only] => only.as_ref().to_string(),
        [head @ .., last] => {
            let head = head
                .iter()
                .map(|s| s.as_ref())
                .collect::<Vec<_>>()
                .join(", ");
            format!("{} and {}", head, last.as_ref())
        }
    }
}

/// Sentence for the live-followed reply.
pub fn live_sentence<S: AsRef<str>>(names: &[S]) -> String {
    match names.len() {
        0 => "None of the channels you follow are live right now.".to_string(),
        1 => format!("{} is live right now.", join_natural(names)),
        _ => format!("{} are live right now.", join_natural(names)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_natural() {
        let empty: [&str; 0] = [];
        assert_eq!(join_natural(&empty), "");
        assert_eq!(join_natural(&["a"]), "a");
        assert_eq!(join_natural(&["a", "b"]), "a and b");
        assert_eq!(join_natural(&["a", "b", "c"]), "a, b and c");
    }

    #[test]
    fn test_live_sentence() {
        let empty: [&str; 0] = [];
        assert_eq!(
            live_sentence(&empty),
            "None of the channels you follow are live right now."
        );
        assert_eq!(live_sentence(&["Shroud"]), "Shroud is live right now.");
        assert_eq!(
            live_sentence(&["Shroud", "Ninja"]),
            "Shroud and Ninja are live right now."
        );
    }
}
