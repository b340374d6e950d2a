use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Ops Console",
        version = "0.1.0",
        description = "Business operations console: customer service requests, staff message inbox, and triage."
    ),
    servers(
        (url = "http://localhost:8080", description = "Local dev")
    ),
    tags(
        (name = "messages", description = "Staff inbox: listing, triage, batch operations, stats"),
        (name = "requests", description = "Customer service request intake and listing"),
        (name = "notifications", description = "Log-and-echo notification endpoint; clients poll for changes")
    ),
    // Handlers (paths)
    paths(
        crate::routes::messages::list_messages,
        crate::routes::messages::create_message,
        crate::routes::messages::update_message,
        crate::routes::messages::delete_message,
        crate::routes::messages::batch_update_messages,
        crate::routes::messages::message_stats,
        crate::routes::requests::create_request,
        crate::routes::requests::list_requests,
        crate::routes::notifications::notification_status,
        crate::routes::notifications::post_notification,
    ),
    // Schemas used in requests/responses
    components(
        schemas(
            crate::models::message::Message,
            crate::models::message::MessageType,
            crate::models::message::MessageStatus,
            crate::models::message::MessagePriority,
            crate::models::message::CreateMessage,
            crate::models::message::Pagination,
            crate::models::message::MessagesPage,
            crate::models::message::MessageEnvelope,
            crate::models::message::MessageStats,
            crate::models::message::StatsEnvelope,
            crate::models::request::Customer,
            crate::models::request::Technician,
            crate::models::request::ServiceRequest,
            crate::models::request::RequestDetail,
            crate::models::request::RequestType,
            crate::models::request::RequestStatus,
            crate::models::request::IntakeEnvelope,
            crate::routes::messages::PatchMessage,
            crate::routes::messages::BatchPatch,
            crate::routes::messages::BatchResult,
            crate::routes::notifications::NotificationAck,
            crate::models::common::ApiError,
            crate::models::common::Ack
        )
    )
)]
pub struct ApiDoc;
