//! ICC Profile Header
//!
//! Only the fields needed to route a profile are decoded: the device class,
//! the data color space, the connection space and the rendering intent.
//! Everything past the 128-byte header is opaque here.

use byteorder::{BigEndian, ByteOrder};

use super::error::IccError;

/// Profile file signature - must be 'acsp'
pub const PROFILE_SIGNATURE: u32 = u32::from_be_bytes(*b"acsp");

/// Minimum valid profile size (header only)
pub const HEADER_SIZE: usize = 128;

/// Decoded ICC header fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IccHeader {
    /// Profile size declared in the header
    pub size: u32,
    /// Major version
    pub version_major: u8,
    /// Device class
    pub device_class: ProfileClass,
    /// Raw data color space signature
    pub color_space: u32,
    /// Raw profile connection space signature
    pub pcs: u32,
    /// Header rendering intent (low 16 bits of the field)
    pub rendering_intent: u32,
}

impl IccHeader {
    /// Parse header from bytes
    pub fn parse(data: &[u8]) -> Result<Self, IccError> {
        if data.len() < HEADER_SIZE {
            return Err(IccError::TooSmall {
                expected: HEADER_SIZE,
                actual: data.len(),
            });
        }

        let signature = BigEndian::read_u32(&data[36..40]);
        if signature != PROFILE_SIGNATURE {
            return Err(IccError::InvalidSignature(signature));
        }

        Ok(Self {
            size: BigEndian::read_u32(&data[0..4]),
            version_major: data[8],
            device_class: ProfileClass::from_u32(BigEndian::read_u32(&data[12..16]))?,
            color_space: BigEndian::read_u32(&data[16..20]),
            pcs: BigEndian::read_u32(&data[20..24]),
            rendering_intent: BigEndian::read_u32(&data[64..68]) & 0xffff,
        })
    }

    /// Data color space, if the signature is a known one
    pub fn data_color_space(&self) -> Result<ColorSpace, IccError> {
        ColorSpace::from_u32(self.color_space)
    }

    /// Profile connection space (for device links, the output space)
    pub fn connection_space(&self) -> Result<ColorSpace, IccError> {
        ColorSpace::from_u32(self.pcs)
    }

    pub fn is_device_link(&self) -> bool {
        self.device_class == ProfileClass::DeviceLink
    }
}

/// ICC Profile Class (Device Class)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileClass {
    /// Input device (scanner, camera)
    Input,
    /// Display device (monitor)
    Display,
    /// Output device (printer)
    Output,
    /// Device link
    DeviceLink,
    /// Color space conversion
    ColorSpace,
    /// Abstract profile
    Abstract,
    /// Named color profile
    NamedColor,
}

impl ProfileClass {
    pub fn from_u32(val: u32) -> Result<Self, IccError> {
        match &val.to_be_bytes() {
            b"scnr" => Ok(Self::Input),
            b"mntr" => Ok(Self::Display),
            b"prtr" => Ok(Self::Output),
            b"link" => Ok(Self::DeviceLink),
            b"spac" => Ok(Self::ColorSpace),
            b"abst" => Ok(Self::Abstract),
            b"nmcl" => Ok(Self::NamedColor),
            _ => Err(IccError::InvalidProfileClass(val)),
        }
    }
}

/// ICC data color space signature
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorSpace {
    Xyz,
    Lab,
    Luv,
    YCbCr,
    Yxy,
    Rgb,
    Gray,
    Hsv,
    Hls,
    Cmyk,
    Cmy,
    /// Generic n-color space ('2CLR' through 'FCLR')
    MultiColor(u8),
}

impl ColorSpace {
    pub fn from_u32(val: u32) -> Result<Self, IccError> {
        let bytes = val.to_be_bytes();
        match &bytes {
            b"XYZ " => Ok(Self::Xyz),
            b"Lab " => Ok(Self::Lab),
            b"Luv " => Ok(Self::Luv),
            b"YCbr" => Ok(Self::YCbCr),
            b"Yxy " => Ok(Self::Yxy),
            b"RGB " => Ok(Self::Rgb),
            b"GRAY" => Ok(Self::Gray),
            b"HSV " => Ok(Self::Hsv),
            b"HLS " => Ok(Self::Hls),
            b"CMYK" => Ok(Self::Cmyk),
            b"CMY " => Ok(Self::Cmy),
            [n, b'C', b'L', b'R'] => match (*n as char).to_digit(16) {
                Some(count) if count >= 2 => Ok(Self::MultiColor(count as u8)),
                _ => Err(IccError::InvalidColorSpace(val)),
            },
            _ => Err(IccError::InvalidColorSpace(val)),
        }
    }
}
