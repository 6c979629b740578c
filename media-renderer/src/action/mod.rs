//! Typed definitions of every remote action the client issues
//!
//! Each action is a marker type implementing [`RendererAction`], declared
//! with [`define_action!`](crate::define_action). [`execute`] is the single
//! path from a typed request to the device control channel.

pub mod macros;

pub mod av_transport;
pub mod connection_manager;
pub mod rendering_control;

pub use av_transport::*;
pub use connection_manager::*;
pub use rendering_control::*;

use tracing::debug;

use crate::channel::{ActionArgs, ActionResponse, DeviceControlChannel};
use crate::error::Result;
use crate::service::Service;

/// A remote action with typed input and output
pub trait RendererAction {
    /// Typed input arguments
    type Request;

    /// Result produced from the device's output arguments
    type Response;

    /// Service the action belongs to
    const SERVICE: Service;

    /// Action name as sent to the device
    const NAME: &'static str;

    /// Build the ordered argument record sent to the device
    fn arguments(request: &Self::Request) -> ActionArgs;

    /// Map the device's output arguments to the typed result
    fn parse_response(response: ActionResponse) -> Result<Self::Response>;
}

/// Invoke `A` through `channel`
///
/// Device errors are returned unchanged.
pub async fn execute<A, C>(channel: &C, request: &A::Request) -> Result<A::Response>
where
    A: RendererAction,
    C: DeviceControlChannel + ?Sized,
{
    let args = A::arguments(request);
    debug!(
        service = A::SERVICE.name(),
        action = A::NAME,
        arguments = args.len(),
        "invoking action"
    );

    let response = channel.invoke_action(A::SERVICE, A::NAME, args).await?;
    A::parse_response(response)
}
