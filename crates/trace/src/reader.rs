use crate::frame::decode_varint;
use crate::record::Record;

/// Decodes consecutive length-delimited records from `bytes`.
///
/// Reading stops quietly at the first framing or payload error; everything
/// decoded up to that point is returned. A torn tail from a build that was
/// killed mid-write must not lose the records before it.
pub fn decode_stream(bytes: &[u8]) -> Vec<Record> {
    let mut records = Vec::new();
    let mut offset = 0usize;

    while offset < bytes.len() {
        let Some((len, consumed)) = decode_varint(&bytes[offset..]) else {
            break;
        };
        let start = offset + consumed;
        let Some(end) = start.checked_add(len as usize) else {
            break;
        };
        if end > bytes.len() {
            break;
        }
        let Ok(record) = serde_json::from_slice::<Record>(&bytes[start..end]) else {
            break;
        };
        records.push(record);
        offset = end;
    }

    records
}
