mod dispatcher;

pub use dispatcher::{
    DEFAULT_QUEUE_CAPACITY, MAX_RETRIES, NotificationDispatcher, Notifier, RETRY_DELAY,
    notification_channel,
};
