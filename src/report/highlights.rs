//! The most recently recorded transactions, labelled with who recorded them.

use serde::Serialize;
use unicode_segmentation::UnicodeSegmentation;

use crate::transaction::TransactionWithUser;

/// How many recent transactions the dashboard shows.
pub const DEFAULT_HIGHLIGHT_COUNT: usize = 5;

/// A recently recorded transaction with a short label for its user.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Highlight {
    /// The transaction and its user.
    #[serde(flatten)]
    pub record: TransactionWithUser,
    /// Up to two characters identifying the user, e.g. "am" for "ama@example.com".
    pub user_prefix: String,
}

/// Pick the `n` most recently created transactions, newest first.
///
/// Ordering uses the creation time rather than the transaction date, with
/// ties broken by the higher ID first.
pub fn select_recent_highlights(records: &[TransactionWithUser], n: usize) -> Vec<Highlight> {
    let mut newest_first: Vec<&TransactionWithUser> = records.iter().collect();
    newest_first.sort_by(|a, b| {
        b.transaction
            .created_at
            .cmp(&a.transaction.created_at)
            .then_with(|| b.transaction.id.cmp(&a.transaction.id))
    });

    newest_first
        .into_iter()
        .take(n)
        .map(|record| Highlight {
            user_prefix: user_prefix(&record.user.email, &record.user.name),
            record: record.clone(),
        })
        .collect()
}

/// The first two characters of `email`, or of `name` when `email` is empty.
///
/// Returns an empty string when both are empty.
pub fn user_prefix(email: &str, name: &str) -> String {
    let source = if email.is_empty() { name } else { email };

    source.graphemes(true).take(2).collect()
}
