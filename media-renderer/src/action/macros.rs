//! Declarative macro for renderer action definitions

/// Define a remote action with its request record and response mapping
///
/// Generates a `<Name>Request` struct holding the typed inputs and a
/// `<Name>Action` marker type implementing
/// [`RendererAction`](crate::action::RendererAction). The action name sent
/// to the device is the identifier itself.
///
/// # Example
/// ```rust,ignore
/// define_action! {
///     /// Set the rendering volume
///     action: SetVolume,
///     service: RenderingControl,
///     request: {
///         instance_id: u32,
///         desired_volume: u16,
///     },
///     arguments: |req| ActionArgs::new()
///         .instance(req.instance_id)
///         .arg("Channel", "Master")
///         .arg("DesiredVolume", req.desired_volume),
///     response: (),
///     parse: |_resp| Ok(()),
/// }
/// ```
#[macro_export]
macro_rules! define_action {
    (
        $(#[$meta:meta])*
        action: $action:ident,
        service: $service:ident,
        request: {
            $($field:ident: $field_type:ty),* $(,)?
        },
        arguments: |$req_param:ident| $args_expr:expr,
        response: $response_type:ty,
        parse: |$resp_param:ident| $parse_expr:expr $(,)?
    ) => {
        ::paste::paste! {
            #[doc = concat!("Input arguments of the `", stringify!($action), "` action")]
            #[derive(::serde::Serialize, Clone, Debug, Default, PartialEq)]
            pub struct [<$action Request>] {
                $(pub $field: $field_type,)*
            }

            $(#[$meta])*
            #[derive(Debug, Clone, Copy, PartialEq, Eq)]
            pub struct [<$action Action>];

            impl $crate::action::RendererAction for [<$action Action>] {
                type Request = [<$action Request>];
                type Response = $response_type;

                const SERVICE: $crate::service::Service = $crate::service::Service::$service;
                const NAME: &'static str = stringify!($action);

                fn arguments($req_param: &Self::Request) -> $crate::channel::ActionArgs {
                    $args_expr
                }

                fn parse_response(
                    $resp_param: $crate::channel::ActionResponse,
                ) -> $crate::error::Result<Self::Response> {
                    $parse_expr
                }
            }
        }
    };
}
