//! Budgeted prompt packing.
//!
//! Retrieved passages arrive ranked best-first. [`pack`] keeps the longest
//! prefix of them whose rendered prompt stays strictly under a length limit,
//! and never reorders or skips a passage to squeeze a later one in.
//!
//! ```text
//! {preamble}Context:
//! {passage 1}
//!
//! ---
//!
//! {passage 2}
//!
//! Question: {query}
//! Answer:
//! ```
//!
//! If even the zero-passage rendering reaches the limit, that rendering is
//! still returned with `used == 0`. Packing has no failure mode.

/// Header that opens the context section.
pub const CONTEXT_HEADER: &str = "Context:\n";

/// Separator placed between consecutive passages.
pub const PASSAGE_DELIMITER: &str = "\n\n---\n\n";

const QUESTION_PREFIX: &str = "\n\nQuestion: ";
const ANSWER_SUFFIX: &str = "\nAnswer:";

/// Measures a rendered prompt in the unit the budget is expressed in.
///
/// The same measure is applied to every probing render and to the final one.
pub trait PromptLength: Send + Sync {
    fn measure(&self, text: &str) -> usize;
}

/// Counts Unicode scalar values. This is the default unit.
#[derive(Debug, Clone, Copy, Default)]
pub struct CharCount;

impl PromptLength for CharCount {
    fn measure(&self, text: &str) -> usize {
        text.chars().count()
    }
}

/// Rough token estimate at four characters per token, rounded up.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApproxTokens;

impl PromptLength for ApproxTokens {
    fn measure(&self, text: &str) -> usize {
        text.chars().count().div_ceil(4)
    }
}

/// Fixed parts of a prompt: caller-supplied preamble and the verbatim query.
#[derive(Debug, Clone, Copy)]
pub struct PromptTemplate<'a> {
    preamble: &'a str,
    query: &'a str,
}

impl<'a> PromptTemplate<'a> {
    pub fn new(preamble: &'a str, query: &'a str) -> Self {
        Self { preamble, query }
    }

    /// Render the prompt for the given passages, in order.
    pub fn render<S: AsRef<str>>(&self, ctxs: &[S]) -> String {
        let body: usize = ctxs.iter().map(|c| c.as_ref().len()).sum::<usize>()
            + PASSAGE_DELIMITER.len() * ctxs.len().saturating_sub(1);
        let mut out = String::with_capacity(
            self.preamble.len()
                + CONTEXT_HEADER.len()
                + body
                + QUESTION_PREFIX.len()
                + self.query.len()
                + ANSWER_SUFFIX.len(),
        );

        out.push_str(self.preamble);
        out.push_str(CONTEXT_HEADER);
        for (i, ctx) in ctxs.iter().enumerate() {
            if i > 0 {
                out.push_str(PASSAGE_DELIMITER);
            }
            out.push_str(ctx.as_ref());
        }
        out.push_str(QUESTION_PREFIX);
        out.push_str(self.query);
        out.push_str(ANSWER_SUFFIX);
        out
    }
}

/// A rendered prompt and the number of leading passages it contains.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackedPrompt {
    pub prompt: String,
    pub used: usize,
}

/// Pack passages under a character budget.
pub fn pack<S: AsRef<str>>(preamble: &str, query: &str, passages: &[S], limit: i64) -> PackedPrompt {
    pack_with(preamble, query, passages, limit, &CharCount)
}

/// Pack passages under a budget measured by `length`.
///
/// A zero or negative `limit` admits no passages.
pub fn pack_with<S, L>(
    preamble: &str,
    query: &str,
    passages: &[S],
    limit: i64,
    length: &L,
) -> PackedPrompt
where
    S: AsRef<str>,
    L: PromptLength + ?Sized,
{
    let template = PromptTemplate::new(preamble, query);
    let limit = usize::try_from(limit).unwrap_or(0);

    let mut used = 0;
    while used < passages.len() && length.measure(&template.render(&passages[..=used])) < limit {
        used += 1;
    }

    PackedPrompt {
        prompt: template.render(&passages[..used]),
        used,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const PREAMBLE: &str = "Answer the question based on the context below.\n\n";

    fn answers() -> Vec<String> {
        (1..=5).map(|i| format!("Answer...{}", i)).collect()
    }

    #[test]
    fn test_render_layout() {
        let template = PromptTemplate::new("Be brief.\n\n", "Why?");
        assert_eq!(
            template.render(&["one", "two"]),
            "Be brief.\n\nContext:\none\n\n---\n\ntwo\n\nQuestion: Why?\nAnswer:"
        );
    }

    #[test]
    fn test_render_empty_context() {
        let template = PromptTemplate::new("", "Q");
        let empty: [&str; 0] = [];
        assert_eq!(template.render(&empty), "Context:\n\n\nQuestion: Q\nAnswer:");
    }

    #[test]
    fn test_pack_reference_budget() {
        let packed = pack(PREAMBLE, "Question?", &answers(), 100);
        let len = packed.prompt.chars().count();
        assert!((90..=100).contains(&len), "prompt length {}", len);
        assert!(len < 100);
        assert_eq!(packed.used, 1);
        assert!(packed.prompt.contains("Answer...1"));
        assert!(!packed.prompt.contains("Answer...2"));
    }

    #[test]
    fn test_pack_no_passages() {
        let empty: Vec<String> = Vec::new();
        let packed = pack(PREAMBLE, "Q", &empty, 50);
        assert_eq!(packed.used, 0);
        assert_eq!(packed.prompt, PromptTemplate::new(PREAMBLE, "Q").render(&empty));
    }

    #[test]
    fn test_pack_tiny_budget_returns_bare_prompt() {
        let packed = pack(PREAMBLE, "Q", &["short"], 1);
        assert_eq!(packed.used, 0);
        let empty: [&str; 0] = [];
        assert_eq!(packed.prompt, PromptTemplate::new(PREAMBLE, "Q").render(&empty));
        assert!(packed.prompt.chars().count() > 1);
    }

    #[test]
    fn test_pack_everything_fits() {
        let packed = pack(PREAMBLE, "Q", &["a", "b", "c"], 1_000_000);
        assert_eq!(packed.used, 3);
        let a = packed.prompt.find("a\n\n---").unwrap();
        let b = packed.prompt.find("b\n\n---").unwrap();
        let c = packed.prompt.find("\n\nc\n\nQuestion").unwrap();
        assert!(a < b && b < c);
    }

    #[test]
    fn test_pack_rank_order_drives_selection() {
        let long = "x".repeat(40);
        // bare prompt with empty preamble and query "Q" is 30 chars
        let long_first = pack("", "Q", &[long.as_str(), "a", "b"], 50);
        assert_eq!(long_first.used, 0);

        let long_last = pack("", "Q", &["a", "b", long.as_str()], 50);
        assert_eq!(long_last.used, 2);
    }

    #[test]
    fn test_pack_boundary_is_strict() {
        let empty: [&str; 0] = [];
        let bare = PromptTemplate::new("", "Q").render(&empty).chars().count() as i64;
        // one-char passage makes the render exactly bare + 1
        assert_eq!(pack("", "Q", &["z"], bare + 1).used, 0);
        assert_eq!(pack("", "Q", &["z"], bare + 2).used, 1);
    }

    #[test]
    fn test_pack_non_positive_limit() {
        assert_eq!(pack(PREAMBLE, "Q", &["a"], 0).used, 0);
        assert_eq!(pack(PREAMBLE, "Q", &["a"], -10).used, 0);
    }

    #[test]
    fn test_pack_counts_characters_not_bytes() {
        // bare prompt is 30 chars; four two-byte chars bring it to 34
        let packed = pack("", "Q", &["éééé"], 35);
        assert_eq!(packed.used, 1);
    }

    #[test]
    fn test_pack_with_approx_tokens() {
        let passages = vec!["word ".repeat(40); 5];
        let packed = pack_with(PREAMBLE, "Question?", &passages, 130, &ApproxTokens);
        assert_eq!(packed.used, 2);
        assert!(ApproxTokens.measure(&packed.prompt) < 130);
    }

    #[test]
    fn test_approx_tokens_rounds_up() {
        assert_eq!(ApproxTokens.measure(""), 0);
        assert_eq!(ApproxTokens.measure("abc"), 1);
        assert_eq!(ApproxTokens.measure("abcde"), 2);
    }

    proptest! {
        #[test]
        fn prop_pack_keeps_maximal_prefix(
            passages in proptest::collection::vec("[a-z ]{0,20}", 0..8),
            limit in 0i64..300,
        ) {
            let packed = pack("Intro.\n\n", "q", &passages, limit);
            let template = PromptTemplate::new("Intro.\n\n", "q");

            prop_assert!(packed.used <= passages.len());
            prop_assert_eq!(&packed.prompt, &template.render(&passages[..packed.used]));

            if packed.used < passages.len() {
                let next = template.render(&passages[..=packed.used]).chars().count() as i64;
                prop_assert!(next >= limit);
            }

            let empty: [&str; 0] = [];
            if (template.render(&empty).chars().count() as i64) < limit {
                prop_assert!((packed.prompt.chars().count() as i64) < limit);
            }
        }

        #[test]
        fn prop_pack_is_deterministic(
            passages in proptest::collection::vec("[a-z]{0,10}", 0..6),
            limit in 0i64..200,
        ) {
            prop_assert_eq!(pack("", "q", &passages, limit), pack("", "q", &passages, limit));
        }
    }
}
