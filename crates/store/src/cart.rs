use async_trait::async_trait;
use common::{LineId, ProductId, UserId};
use domain::CartLine;

use crate::Result;

/// Cart line persistence.
///
/// The store enforces the natural-key uniqueness invariant: at most one
/// line per (user, product, size, color), with null size/color taking
/// part in the key. Two racing adds for the same key must merge into one
/// line via [`upsert_line`], never produce duplicates.
///
/// All line access is scoped by `user_id`; there is no way to read or
/// mutate another user's lines through this trait.
///
/// [`upsert_line`]: CartStore::upsert_line
#[async_trait]
pub trait CartStore: Send + Sync {
    /// Finds a line by its natural key. `None` only matches `None`.
    async fn find_line(
        &self,
        user_id: UserId,
        product_id: ProductId,
        size: Option<&str>,
        color: Option<&str>,
    ) -> Result<Option<CartLine>>;

    /// Loads a line by id, scoped to its owner.
    async fn get_line(&self, user_id: UserId, line_id: LineId) -> Result<Option<CartLine>>;

    /// Inserts the line, or merges its quantity into the existing line
    /// with the same natural key. Returns the stored line either way.
    ///
    /// This is one atomic write; callers pass the quantity DELTA being
    /// added, not a precomputed total.
    async fn upsert_line(&self, line: CartLine) -> Result<CartLine>;

    /// Overwrites a line's quantity. Returns false if the line does not
    /// exist for this user.
    async fn set_quantity(&self, user_id: UserId, line_id: LineId, quantity: u32) -> Result<bool>;

    /// Deletes a line. Idempotent: deleting an absent line succeeds.
    async fn delete_line(&self, user_id: UserId, line_id: LineId) -> Result<()>;

    /// Deletes every line of a user. Idempotent.
    async fn clear_user(&self, user_id: UserId) -> Result<()>;

    /// Lists a user's lines, oldest first.
    async fn lines_for_user(&self, user_id: UserId) -> Result<Vec<CartLine>>;
}
