/// Infer the deployment environment from a resource name.
///
/// Rules are checked in order and the first match wins:
/// `prod`/`prd` → `prd`, `hml`/`homol` → `hml`, `dev` → `dev`, otherwise
/// `undefined`. An empty name yields an empty string.
pub fn classify(resource_name: &str) -> &'static str {
    if resource_name.is_empty() {
        return "";
    }

    let name = resource_name.to_lowercase();
    if name.contains("prod") || name.contains("prd") {
        "prd"
    } else if name.contains("hml") || name.contains("homol") {
        "hml"
    } else if name.contains("dev") {
        "dev"
    } else {
        "undefined"
    }
}
