use super::MeterReading;
use crate::config::ValidationConfig;
use crate::error::ReadingError;

/// Checks a new value against the last accepted reading.
///
/// The meter only counts up, and never by more than `max_delta` between two
/// readings. Without a previous reading every value is accepted. Rejections
/// are returned, not logged; the caller reports them once.
pub fn validate(
    current: f64,
    last: Option<&MeterReading>,
    config: &ValidationConfig,
) -> Result<(), ReadingError> {
    let Some(last) = last else {
        return Ok(());
    };

    if current < last.value {
        return Err(ReadingError::ReadingDecreased {
            current,
            last: last.value,
            time: last.formatted_time(),
        });
    }

    if (current - last.value).abs() > config.max_delta {
        return Err(ReadingError::ReadingJump {
            current,
            last: last.value,
            max_delta: config.max_delta,
            time: last.formatted_time(),
        });
    }

    Ok(())
}
