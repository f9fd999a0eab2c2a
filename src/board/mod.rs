//! Kanban board: client-side state and drag reconciliation.
//!
//! ## Module Map
//!
//! | Module       | Responsibility                                            |
//! |--------------|-----------------------------------------------------------|
//! | `models`     | Shared types: `Task`, `TaskStatus`, `BucketMap`, `User`   |
//! | `store`      | `TaskStore` trait: the remote task store contract         |
//! | `state`      | `BoardState` cache + `MoveTransaction` undo records       |
//! | `controller` | `DragController`: optimistic move, reconcile or rollback  |
//! | `notices`    | Ephemeral auto-clearing banners                           |
//! | `events`     | `TaskEvents` observer registry                            |
//!
//! ## Typical Flow (drag a card to another column)
//!
//! 1. `DragController::drag_start()` finds the card by searching every column.
//! 2. `DragController::drag_end()` resolves the drop target to a column,
//!    checks the permission predicate locally and applies the move to
//!    `BoardState` before any network call.
//! 3. `TaskStore::update_task_status()` is awaited.
//! 4. Success → refetch and replace the cache with server truth (or keep the
//!    optimistic state and warn if the refetch does not show the move).
//!    Failure → `BoardState::rollback()` and a transient notice.

pub mod controller;
pub mod events;
pub mod models;
pub mod notices;
pub mod state;
pub mod store;

#[cfg(test)]
pub(crate) mod test_support;
