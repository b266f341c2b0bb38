pub(crate) mod api_message;
pub(crate) mod notification;
