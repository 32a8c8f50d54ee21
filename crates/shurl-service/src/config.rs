use typed_builder::TypedBuilder;

/// Default number of tasks that may wait in the queue before submitters
/// are back-pressured.
pub const DEFAULT_QUEUE_CAPACITY: usize = 300;

/// Settings for a [`LinkService`](crate::LinkService) worker.
///
/// # Example
///
/// ```
/// use shurl_service::ServiceConfig;
///
/// let config = ServiceConfig::builder().queue_capacity(16).build();
/// assert_eq!(config.queue_capacity, 16);
/// ```
#[derive(Debug, Clone, TypedBuilder)]
pub struct ServiceConfig {
    /// Capacity of the bounded task queue. Must be greater than zero.
    #[builder(default = DEFAULT_QUEUE_CAPACITY)]
    pub queue_capacity: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_queue_capacity() {
        assert_eq!(ServiceConfig::default().queue_capacity, 300);
    }
}
