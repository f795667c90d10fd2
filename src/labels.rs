use crate::azure::models::ResourceDescriptor;
use crate::environment;

/// Label names carried by every emitted sample, in registration order
pub const LABEL_NAMES: [&str; 4] = ["resource_group", "resource_type", "resource_name", "resource_environment"];

/// Labels identifying the resource a sample belongs to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceLabelSet {
    pub resource_group: String,
    pub resource_type: String,
    pub resource_name: String,
    pub resource_environment: String,
}

impl ResourceLabelSet {
    /// Derive labels for a value of `resource`; `value_id` is the metric value's ARM id
    pub fn derive(value_id: &str, resource: &ResourceDescriptor) -> Self {
        let resource_group = resource_group_of(value_id)
            .or_else(|| resource_group_of(&resource.id))
            .unwrap_or_default();

        Self {
            resource_group,
            resource_type: resource.resource_type.clone(),
            resource_name: resource.name.clone(),
            resource_environment: environment::classify(&resource.name).to_string(),
        }
    }

    /// Label values in [`LABEL_NAMES`] order
    pub fn values(&self) -> [&str; 4] {
        [
            self.resource_group.as_str(),
            self.resource_type.as_str(),
            self.resource_name.as_str(),
            self.resource_environment.as_str(),
        ]
    }
}

/// Segment following `resourceGroups` in an ARM id
fn resource_group_of(id: &str) -> Option<String> {
    let mut segments = id.split('/');
    while let Some(segment) = segments.next() {
        if segment.eq_ignore_ascii_case("resourceGroups") {
            return segments.next().filter(|group| !group.is_empty()).map(str::to_string);
        }
    }
    None
}
