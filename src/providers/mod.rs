//! Service providers started by the [`SystemCoordinator`](crate::coordinator::SystemCoordinator).

pub mod dbus;
pub mod traits;

pub use dbus::DBusServiceProvider;
pub use traits::ServiceProvider;
