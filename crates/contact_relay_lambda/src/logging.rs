use serde_json::{json, Value};

/// Emits one structured JSON log line on stderr, which Lambda forwards to
/// CloudWatch.
pub fn log_info(component: &str, event: &str, details: Value) {
    emit(component, None, event, details);
}

pub fn log_warn(component: &str, event: &str, details: Value) {
    emit(component, Some("warn"), event, details);
}

pub fn log_error(component: &str, event: &str, details: Value) {
    emit(component, Some("error"), event, details);
}

fn emit(component: &str, level: Option<&str>, event: &str, details: Value) {
    eprintln!("{}", log_line(component, level, event, details));
}

fn log_line(component: &str, level: Option<&str>, event: &str, details: Value) -> Value {
    let mut line = json!({
        "component": component,
        "event": event,
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "details": details,
    });
    if let (Some(level), Some(object)) = (level, line.as_object_mut()) {
        object.insert("level".to_string(), Value::from(level));
    }
    line
}
