//! UseCase 層
//!
//! 同期レイヤーのロジックを実装するレイヤー。
//! UI 層から呼び出され、Domain 層の状態を更新し、Infrastructure 層のチャネルを操作します。

pub mod connection;
pub mod dispatch_frame;
pub mod observer;
pub mod session;

#[cfg(test)]
pub(crate) mod testing;

pub use connection::{ConnectionManager, PendingReconnect};
pub use dispatch_frame::{DispatchFrameUseCase, Dispatched};
pub use observer::{ChannelObserver, NoopObserver, SyncEvent, SyncObserver};
pub use session::{SessionCommand, SessionEvent, SessionSnapshot, SyncSession};
