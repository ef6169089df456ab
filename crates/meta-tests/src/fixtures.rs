//! Builders for metadata blobs
//!
//! Every builder emits the exact on-disk layout, so tests can assert on
//! byte offsets.

/// A bare 128-byte ICC header (plus a small tag-less body)
pub fn icc_header(class: &[u8; 4], space: &[u8; 4], pcs: &[u8; 4]) -> Vec<u8> {
    let mut data = vec![0u8; 132];
    data[0..4].copy_from_slice(&132u32.to_be_bytes());
    data[8] = 2;
    data[12..16].copy_from_slice(class);
    data[16..20].copy_from_slice(space);
    data[20..24].copy_from_slice(pcs);
    data[36..40].copy_from_slice(b"acsp");
    data
}

/// The built-in sRGB profile with another creator signature: same colors,
/// different bytes
pub fn retagged_srgb() -> Vec<u8> {
    let mut data = oxmeta_core::SRGB_ICC.to_vec();
    data[80..84].copy_from_slice(b"oxmt");
    data
}

/// One 8BIM resource record
pub fn resource(id: u16, name: &[u8], payload: &[u8]) -> Vec<u8> {
    let mut out = b"8BIM".to_vec();
    out.extend(id.to_be_bytes());
    out.push(name.len() as u8);
    out.extend(name);
    if name.len() % 2 == 0 {
        out.push(0);
    }
    out.extend((payload.len() as u32).to_be_bytes());
    out.extend(payload);
    if payload.len() % 2 == 1 {
        out.push(0);
    }
    out
}

/// Resolution info payload in 16.16 fixed point
pub fn resolution_info(x: f64, units: u16, y: f64) -> Vec<u8> {
    let mut out = Vec::with_capacity(16);
    out.extend(((x * 65536.0) as u32).to_be_bytes());
    out.extend(units.to_be_bytes());
    out.extend(1u16.to_be_bytes());
    out.extend(((y * 65536.0) as u32).to_be_bytes());
    out.extend(units.to_be_bytes());
    out.extend(1u16.to_be_bytes());
    out
}

/// Value stored in an IFD entry
#[derive(Debug, Clone)]
pub enum IfdValue {
    Short(u16),
    Long(u32),
    Rational(u32, u32),
    Ascii(String),
    /// Pointer to the next directory added with [`ExifBuilder::sub_directory`]
    SubIfd(usize),
}

/// Builds a TIFF/EXIF buffer with any number of directories
#[derive(Debug, Clone)]
pub struct ExifBuilder {
    big_endian: bool,
    signature: bool,
    directories: Vec<Vec<(u16, IfdValue)>>,
}

impl ExifBuilder {
    pub fn new(big_endian: bool) -> Self {
        Self {
            big_endian,
            signature: true,
            directories: vec![Vec::new()],
        }
    }

    /// Leave out the `Exif\0\0` prefix
    pub fn without_signature(mut self) -> Self {
        self.signature = false;
        self
    }

    /// Add an entry to the most recent directory
    pub fn entry(mut self, tag: u16, value: IfdValue) -> Self {
        if let Some(directory) = self.directories.last_mut() {
            directory.push((tag, value));
        }
        self
    }

    /// Start a new directory; returns its index for [`IfdValue::SubIfd`]
    pub fn sub_directory(mut self) -> (Self, usize) {
        self.directories.push(Vec::new());
        let index = self.directories.len() - 1;
        (self, index)
    }

    fn u16(&self, value: u16) -> [u8; 2] {
        if self.big_endian {
            value.to_be_bytes()
        } else {
            value.to_le_bytes()
        }
    }

    fn u32(&self, value: u32) -> [u8; 4] {
        if self.big_endian {
            value.to_be_bytes()
        } else {
            value.to_le_bytes()
        }
    }

    pub fn build(&self) -> Vec<u8> {
        // directories are laid out back to back after the header, each
        // followed by its out-of-line values
        let mut offsets = Vec::with_capacity(self.directories.len());
        let mut at = 8usize;
        for directory in &self.directories {
            offsets.push(at);
            at += 2 + 12 * directory.len() + 4;
            at += directory.iter().map(|(_, v)| out_of_line(v).len()).sum::<usize>();
        }

        let mut tiff = Vec::new();
        tiff.extend(if self.big_endian { *b"MM" } else { *b"II" });
        tiff.extend(self.u16(0x2a));
        tiff.extend(self.u32(8));
        for (index, directory) in self.directories.iter().enumerate() {
            let mut extra_at = offsets[index] + 2 + 12 * directory.len() + 4;
            let mut extra = Vec::new();
            tiff.extend(self.u16(directory.len() as u16));
            for (tag, value) in directory {
                let (format, count) = match value {
                    IfdValue::Short(_) => (3u16, 1u32),
                    IfdValue::Long(_) | IfdValue::SubIfd(_) => (4, 1),
                    IfdValue::Rational(..) => (5, 1),
                    IfdValue::Ascii(text) => (2, text.len() as u32 + 1),
                };
                tiff.extend(self.u16(*tag));
                tiff.extend(self.u16(format));
                tiff.extend(self.u32(count));
                let inline: Vec<u8> = match value {
                    IfdValue::Short(v) => {
                        let mut field = self.u16(*v).to_vec();
                        field.extend([0, 0]);
                        field
                    }
                    IfdValue::Long(v) => self.u32(*v).to_vec(),
                    IfdValue::SubIfd(target) => self.u32(offsets[*target] as u32).to_vec(),
                    IfdValue::Ascii(text) if text.len() < 4 => {
                        let mut field = text.as_bytes().to_vec();
                        field.resize(4, 0);
                        field
                    }
                    IfdValue::Rational(..) | IfdValue::Ascii(_) => {
                        let field = self.u32(extra_at as u32).to_vec();
                        let bytes = match value {
                            IfdValue::Rational(n, d) => {
                                let mut b = self.u32(*n).to_vec();
                                b.extend(self.u32(*d));
                                b
                            }
                            _ => out_of_line(value),
                        };
                        extra_at += bytes.len();
                        extra.extend(bytes);
                        field
                    }
                };
                tiff.extend(inline);
            }
            tiff.extend(self.u32(0));
            tiff.extend(extra);
        }

        let mut out = if self.signature {
            b"Exif\0\0".to_vec()
        } else {
            Vec::new()
        };
        out.extend(tiff);
        out
    }
}

fn out_of_line(value: &IfdValue) -> Vec<u8> {
    match value {
        IfdValue::Rational(..) => vec![0; 8],
        IfdValue::Ascii(text) if text.len() >= 4 => {
            let mut bytes = text.as_bytes().to_vec();
            bytes.push(0);
            bytes
        }
        _ => Vec::new(),
    }
}

/// XMP packet with one `tiff:` element per field
pub fn xmp_packet(fields: &[(&str, &str)]) -> Vec<u8> {
    let mut body = String::new();
    for (name, value) in fields {
        body.push_str(&format!("<tiff:{name}>{value}</tiff:{name}>"));
    }
    format!(
        "<?xpacket begin=\"\u{feff}\" id=\"W5M0MpCehiHzreSzNTczkc9d\"?>\
         <x:xmpmeta xmlns:x=\"adobe:ns:meta/\">\
         <rdf:RDF xmlns:rdf=\"http://www.w3.org/1999/02/22-rdf-syntax-ns#\">\
         <rdf:Description rdf:about=\"\" xmlns:tiff=\"http://ns.adobe.com/tiff/1.0/\">\
         {body}</rdf:Description></rdf:RDF></x:xmpmeta>\
         <?xpacket end=\"w\"?>"
    )
    .into_bytes()
}

/// One 26-byte clipping path record
pub fn path_record(selector: u16, values: &[i32]) -> Vec<u8> {
    let mut out = selector.to_be_bytes().to_vec();
    for value in values {
        out.extend(value.to_be_bytes());
    }
    out.resize(26, 0);
    out
}

/// Subpath length record announcing `knots` knots
pub fn subpath_record(selector: u16, knots: u16) -> Vec<u8> {
    let mut out = selector.to_be_bytes().to_vec();
    out.extend(knots.to_be_bytes());
    out.resize(26, 0);
    out
}

/// A fraction of the canvas in 8.24 fixed point
pub fn fixed(fraction: f64) -> i32 {
    (fraction * 16_777_216.0) as i32
}
