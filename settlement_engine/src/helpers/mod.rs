//! Small helpers shared across the engine.

use chrono::Utc;

/// Builds a ledger txid of the form `{prefix}-{subject}:{unix-seconds}:{random}`.
///
/// The prefix names the movement (`payout`, `deposit`, …), the subject ties it to the entity it
/// belongs to, and the random tail keeps ids unique when the same subject moves money twice in
/// the same second. Deterministic ids (retry-safe) are built by callers directly where the
/// operation can only ever happen once per entity.
pub fn new_txid(prefix: &str, subject: &str) -> String {
    let timestamp = Utc::now().timestamp();
    format!("{prefix}-{subject}:{timestamp}:{:08x}", rand::random::<u32>())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn txids_carry_their_prefix_and_do_not_collide() {
        let a = new_txid("payout", "farmer-1");
        let b = new_txid("payout", "farmer-1");
        assert!(a.starts_with("payout-farmer-1:"));
        assert_ne!(a, b);
    }
}
