//! ICC profiles generated with lcms2

use anyhow::{Context, Result};
use lcms2::{CIExyY, Flags, GlobalContext, Intent, PixelFormat, Profile, ToneCurve, Transform};

fn d50_white_point() -> CIExyY {
    CIExyY {
        x: 0.3457,
        y: 0.3585,
        Y: 1.0,
    }
}

/// lcms2's built-in sRGB, serialized
pub fn lcms2_srgb_icc() -> Result<Vec<u8>> {
    Profile::new_srgb().icc().context("sRGB serialization")
}

/// Gray profile with a D50 white point and a 2.2 gamma
pub fn lcms2_gray_icc() -> Result<Vec<u8>> {
    let gray = Profile::new_gray(&d50_white_point(), &ToneCurve::new(2.2))
        .context("gray profile creation")?;
    gray.icc().context("gray serialization")
}

/// Abstract v4 Lab identity profile with a D50 white point
pub fn lcms2_lab_icc() -> Result<Vec<u8>> {
    let lab = Profile::new_lab4_context(GlobalContext::new(), &d50_white_point())
        .context("Lab profile creation")?;
    lab.icc().context("Lab serialization")
}

/// XYZ identity profile
pub fn lcms2_xyz_icc() -> Result<Vec<u8>> {
    Profile::new_xyz().icc().context("XYZ serialization")
}

/// Device link taking sRGB straight to the gray profile above
pub fn lcms2_srgb_to_gray_link() -> Result<Vec<u8>> {
    let srgb = Profile::new_srgb();
    let gray = Profile::new_gray(&d50_white_point(), &ToneCurve::new(2.2))
        .context("gray profile creation")?;
    let transform = Transform::<[u16; 3], u16>::new(
        &srgb,
        PixelFormat::RGB_16,
        &gray,
        PixelFormat::GRAY_16,
        Intent::Perceptual,
    )
    .context("transform creation")?;
    let link = Profile::new_device_link(&transform, 4.3, Flags::default())
        .context("device link creation")?;
    link.icc().context("device link serialization")
}

/// Convert 16-bit RGB pixels to gray with lcms2
pub fn lcms2_rgb_to_gray(pixels: &[[u16; 3]]) -> Result<Vec<u16>> {
    let srgb = Profile::new_srgb();
    let gray = Profile::new_gray(&d50_white_point(), &ToneCurve::new(2.2))
        .context("gray profile creation")?;
    let transform = Transform::<[u16; 3], u16>::new(
        &srgb,
        PixelFormat::RGB_16,
        &gray,
        PixelFormat::GRAY_16,
        Intent::Perceptual,
    )
    .context("transform creation")?;
    let mut out = vec![0u16; pixels.len()];
    transform.transform_pixels(pixels, &mut out);
    Ok(out)
}
