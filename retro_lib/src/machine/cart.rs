//! Cartridge header decoding.
//!
//! The header is a fixed-layout record at a known offset in the ROM image.
//! Everything in it is informational except the cartridge-type code, which
//! selects the controller variant.

use crate::error::{RetroError, RetroResult};
use log::info;

/// File offset of the header record.
pub const HEADER_OFFSET: u64 = 0x100;

/// Size of the header record in bytes.
pub const HEADER_SIZE: usize = 0x50;

pub const LOGO_SIZE: usize = 48;
pub const TITLE_SIZE: usize = 11;
pub const MANUFACTURER_CODE_SIZE: usize = 4;
pub const NEW_LICENSEE_CODE_SIZE: usize = 2;

/// Decoded cartridge header.
pub struct CartHeader {
    pub entry_point: u32,
    pub logo: [u8; LOGO_SIZE],
    pub title: [u8; TITLE_SIZE],
    pub manufacturer_code: [u8; MANUFACTURER_CODE_SIZE],
    pub cgb_flag: u8,
    pub new_licensee_code: [u8; NEW_LICENSEE_CODE_SIZE],
    pub sgb_flag: u8,
    pub cart_type: u8,
    pub rom_size: u8,
    pub ram_size: u8,
    pub dest_code: u8,
    pub old_licensee_code: u8,
    pub rom_version: u8,
    pub header_checksum: u8,
    /// Stored big-endian, unlike everything else on this bus.
    pub global_checksum: u16,
}

impl CartHeader {
    /// Decode the header from its raw `HEADER_SIZE`-byte window.
    pub fn parse(raw: &[u8]) -> RetroResult<CartHeader> {
        if raw.len() < HEADER_SIZE {
            return Err(RetroError::BadCartImage(format!(
                "header window is {} bytes, need {HEADER_SIZE}",
                raw.len()
            )));
        }

        Ok(CartHeader {
            entry_point: u32::from_le_bytes(raw[0..4].try_into().unwrap()),
            logo: raw[4..52].try_into().unwrap(),
            title: raw[52..63].try_into().unwrap(),
            manufacturer_code: raw[63..67].try_into().unwrap(),
            cgb_flag: raw[67],
            new_licensee_code: raw[68..70].try_into().unwrap(),
            sgb_flag: raw[70],
            cart_type: raw[71],
            rom_size: raw[72],
            ram_size: raw[73],
            dest_code: raw[74],
            old_licensee_code: raw[75],
            rom_version: raw[76],
            header_checksum: raw[77],
            global_checksum: u16::from_be_bytes(raw[78..80].try_into().unwrap()),
        })
    }

    pub fn title(&self) -> String {
        String::from_utf8_lossy(&self.title)
            .trim_end_matches('\0')
            .to_string()
    }

    /// Log the header fields the way a boot banner would print them.
    pub fn log_banner(&self) {
        info!("Title: {}", self.title());
        info!(
            "Manufacturer code: {}",
            String::from_utf8_lossy(&self.manufacturer_code)
        );
        info!("CGB flag: {}", self.cgb_flag);
        info!(
            "New licensee code: {}",
            String::from_utf8_lossy(&self.new_licensee_code)
        );
        info!("SGB flag: {}", self.sgb_flag);
        info!("Cartridge type: {:02x}", self.cart_type);
        info!("ROM size: {:02x}", self.rom_size);
        info!("RAM size: {:02x}", self.ram_size);
        info!("Destination code: {:02x}", self.dest_code);
        info!("Old licensee code: {:02x}", self.old_licensee_code);
        info!("ROM version: {:02x}", self.rom_version);
        info!("Header checksum: {:02x}", self.header_checksum);
        info!("Global checksum: {:04x}", self.global_checksum);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Builds a header window with recognizable field values.
    pub fn sample_header(cart_type: u8) -> [u8; HEADER_SIZE] {
        let mut raw = [0u8; HEADER_SIZE];

        raw[0..4].copy_from_slice(&0xdead_beefu32.to_le_bytes());
        raw[4..4 + LOGO_SIZE].fill(0xce);
        raw[52..52 + 9].copy_from_slice(b"TESTCART\0");
        raw[63..67].copy_from_slice(b"ABCD");
        raw[67] = 0x80; // cgb
        raw[68..70].copy_from_slice(b"01");
        raw[70] = 0x00; // sgb
        raw[71] = cart_type;
        raw[72] = 0x01; // rom size code
        raw[73] = 0x00; // ram size code
        raw[74] = 0x01; // dest
        raw[75] = 0x33; // old licensee
        raw[76] = 0x00; // version
        raw[77] = 0x5a; // header checksum
        raw[78..80].copy_from_slice(&[0x12, 0x34]); // global, big-endian
        raw
    }

    #[test]
    fn parse_fields() {
        let header = CartHeader::parse(&sample_header(0x00)).unwrap();

        assert_eq!(header.entry_point, 0xdead_beef);
        assert_eq!(header.title(), "TESTCART");
        assert_eq!(&header.manufacturer_code, b"ABCD");
        assert_eq!(header.cgb_flag, 0x80);
        assert_eq!(&header.new_licensee_code, b"01");
        assert_eq!(header.cart_type, 0x00);
        assert_eq!(header.rom_size, 0x01);
        assert_eq!(header.dest_code, 0x01);
        assert_eq!(header.old_licensee_code, 0x33);
        assert_eq!(header.header_checksum, 0x5a);
        // Global checksum is the one big-endian field.
        assert_eq!(header.global_checksum, 0x1234);
    }

    #[test]
    fn short_window_rejected() {
        assert!(matches!(
            CartHeader::parse(&[0u8; HEADER_SIZE - 1]),
            Err(RetroError::BadCartImage(_))
        ));
    }
}
