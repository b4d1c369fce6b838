use crate::ble::adv_payload::AdvertisingPayload;
use crate::ble::AdvUuid;
use crate::config::ADV_DATA_MAX_LEN;
use crate::error::DriverError;

const AD_TYPE_FLAGS: u8 = 0x01;
const AD_TYPE_UUID16_COMPLETE: u8 = 0x03;
const AD_TYPE_UUID128_COMPLETE: u8 = 0x07;

/// Encode `payload` as legacy advertising data (`[len][type][data]...`).
///
/// Layout: flags, then the complete 16-bit UUID list, then the complete
/// 128-bit UUID list; empty lists are omitted. Returns the number of bytes
/// written, or `DataSize` if it does not fit `buf` or the 31-byte limit.
pub fn encode(payload: &AdvertisingPayload, buf: &mut [u8]) -> Result<usize, DriverError> {
    let limit = buf.len().min(ADV_DATA_MAX_LEN);
    let mut w = 0usize;

    push_structure(buf, limit, &mut w, AD_TYPE_FLAGS, &[payload.flags()])?;

    let short = payload.uuids().iter().filter_map(|u| match u {
        AdvUuid::Uuid16(v) => Some(v.to_le_bytes()),
        AdvUuid::Uuid128(_) => None,
    });
    let short_count = short.clone().count();
    if short_count > 0 {
        let start = open_structure(buf, limit, &mut w, AD_TYPE_UUID16_COMPLETE, short_count * 2)?;
        for (i, bytes) in short.enumerate() {
            buf[start + i * 2..start + i * 2 + 2].copy_from_slice(&bytes);
        }
    }

    let long = payload.uuids().iter().filter_map(|u| match u {
        AdvUuid::Uuid128(v) => Some(v),
        AdvUuid::Uuid16(_) => None,
    });
    let long_count = long.clone().count();
    if long_count > 0 {
        let start = open_structure(buf, limit, &mut w, AD_TYPE_UUID128_COMPLETE, long_count * 16)?;
        for (i, bytes) in long.enumerate() {
            buf[start + i * 16..start + i * 16 + 16].copy_from_slice(bytes);
        }
    }

    Ok(w)
}

fn push_structure(
    buf: &mut [u8],
    limit: usize,
    w: &mut usize,
    ad_type: u8,
    data: &[u8],
) -> Result<(), DriverError> {
    let start = open_structure(buf, limit, w, ad_type, data.len())?;
    buf[start..start + data.len()].copy_from_slice(data);
    Ok(())
}

/// Write the `[len][type]` header and reserve `data_len` bytes.
/// Returns the offset of the data area.
fn open_structure(
    buf: &mut [u8],
    limit: usize,
    w: &mut usize,
    ad_type: u8,
    data_len: usize,
) -> Result<usize, DriverError> {
    let total = 2 + data_len;
    if *w + total > limit {
        return Err(DriverError::DataSize);
    }
    buf[*w] = (1 + data_len) as u8;
    buf[*w + 1] = ad_type;
    let start = *w + 2;
    *w += total;
    Ok(start)
}
