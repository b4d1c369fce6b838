use core::fmt::Write;

use crate::config::DEVICE_ID_MAX_LEN;
use heapless::String;

/// Human-readable badge identifier derived from the factory device id word
/// (FICR `DEVICEID[1]`): `"NSEC"` + 4 upper-case hex digits.
///
/// Used as GAP device name and shown on the status screen.
pub fn format_device_id(device_id_word: u32) -> String<DEVICE_ID_MAX_LEN> {
    let short = (device_id_word % 0xFFFF) as u16;
    let mut id = String::new();
    let _ = write!(id, "NSEC{:04X}", short);
    id
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pads_to_four_hex_digits() {
        assert_eq!(format_device_id(0x0000_00AB).as_str(), "NSEC00AB");
    }

    #[test]
    fn reduces_modulo_0xffff() {
        assert_eq!(format_device_id(0xFFFF).as_str(), "NSEC0000");
        assert_eq!(format_device_id(0x1_0000).as_str(), "NSEC0001");
        assert_eq!(format_device_id(0xDEAD_BEEF).as_str(), "NSEC9D9D");
    }
}
