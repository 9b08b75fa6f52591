use std::future::Future;
use std::pin::Pin;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub mod chatrooms;
pub mod exemptions;
pub mod groups;
pub mod invitations;
pub mod notifications;
pub mod store;
pub mod users;
