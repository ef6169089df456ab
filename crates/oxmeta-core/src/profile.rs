//! Profile management on [`Image`]
//!
//! Every insertion runs through the sanitizer before it reaches the store.
//! Profiles that are also mirrored inside a Photoshop resource block (ICC,
//! IPTC, XMP) are written back into the stored "8bim" profile so both copies
//! stay consistent, and an "8bim" profile is fanned out into its embedded
//! profiles when stored.

use tracing::debug;

use crate::error::Warning;
use crate::image::{Image, artifact_flag};
use crate::metadata::eightbim::{self, ClipRemap};
use crate::metadata::{MetadataState, exif, xmp};
use crate::sanitize;
use crate::store::{Profile, ProfileStore};
use crate::types::RectangleInfo;

/// Artifact that turns on XML validation of XMP profiles
pub const XMP_VALIDATE_ARTIFACT: &str = "xmp:validate";

impl Image {
    /// Store a profile under `name`, replacing any previous one.
    ///
    /// Returns false (and raises a warning) when the profile is rejected.
    pub fn set_profile(&mut self, name: &str, data: Vec<u8>) -> bool {
        self.set_profile_internal(name, data, false)
    }

    /// Insertion path shared with the 8BIM fan-out; `recursive` suppresses
    /// the write-back into the stored resource block.
    pub(crate) fn set_profile_internal(
        &mut self,
        name: &str,
        mut data: Vec<u8>,
        recursive: bool,
    ) -> bool {
        if let Err(warning) =
            sanitize::check_size(name, data.len(), self.settings.max_profile_size)
        {
            self.raise_warning(warning);
            return false;
        }

        let lower = name.to_ascii_lowercase();
        match lower.as_str() {
            "xmp" => {
                sanitize::repair_xmp(&mut data);
            }
            "exif" | "app1" => {
                sanitize::repair_exif(&mut data);
            }
            _ => {}
        }

        let key = sanitize::canonical_name(&lower, &data);
        if key == "xmp"
            && artifact_flag(self.artifact(XMP_VALIDATE_ARTIFACT), false)
            && !sanitize::validate_xmp(&data)
        {
            self.raise_warning(Warning::CorruptImageProfile { name: key });
            return false;
        }

        if key == "8bim" {
            eightbim::decode(self, &data);
        } else if !recursive {
            self.write_to_resource_block(&key, Some(&data));
        }

        let harvested = if key == "exif" {
            exif::properties(&data)
        } else {
            Vec::new()
        };

        debug!(name = %key, size = data.len(), recursive, "set profile");
        self.profiles.insert(Profile::new(&key, data));

        for (property, value) in harvested {
            if self.property(property).is_none() {
                self.set_property(property, value);
            }
        }
        true
    }

    /// Mirror a profile change into the stored "8bim" block
    fn write_to_resource_block(&mut self, name: &str, data: Option<&[u8]>) {
        let Some(id) = eightbim::resource_id(name) else {
            return;
        };
        if let Some(block) = self.profiles.get_mut("8bim") {
            if eightbim::rewrite(block.data_mut(), id, data) {
                debug!(name, id, removed = data.is_none(), "updated 8bim resource");
            }
        }
    }

    pub fn get_profile(&self, name: &str) -> Option<&Profile> {
        self.profiles.get(name)
    }

    /// Read-only view of every stored profile
    pub fn profiles(&self) -> &ProfileStore {
        &self.profiles
    }

    /// Delete a profile; returns false if it did not exist
    pub fn delete_profile(&mut self, name: &str) -> bool {
        self.remove_profile(name).is_some()
    }

    /// Detach a profile from the image and hand it back
    pub fn remove_profile(&mut self, name: &str) -> Option<Profile> {
        if !self.profiles.contains(name) {
            return None;
        }
        self.write_to_resource_block(name, None);
        debug!(name, "delete profile");
        self.profiles.remove(name)
    }

    /// Replace every profile with a deep copy of `source`'s profiles
    pub fn clone_profiles(&mut self, source: &Image) {
        self.profiles.clear();
        for profile in source.profiles.iter() {
            self.profiles.insert(profile.clone());
        }
    }

    pub fn destroy_profiles(&mut self) {
        self.profiles.clear();
    }

    pub fn reset_profile_iterator(&mut self) {
        self.profiles.reset_iterator();
    }

    /// Next profile name under the image's profile cursor
    pub fn next_profile(&mut self) -> Option<String> {
        self.profiles.next_name()
    }

    /// Store the built-in sRGB profile as "icc" unless one is present
    pub fn set_srgb_profile(&mut self) -> bool {
        if self.profiles.contains("icc") {
            return false;
        }
        self.set_profile("icc", crate::SRGB_ICC.to_vec())
    }

    /// Push resolution, units and orientation into the 8BIM, EXIF and XMP
    /// profiles.
    ///
    /// Returns false if a stored EXIF profile has no usable TIFF header.
    pub fn sync_profiles(&mut self) -> bool {
        let state = MetadataState::of(self);
        let mut status = true;
        if let Some(block) = self.profiles.get_mut("8bim") {
            eightbim::sync(block.data_mut(), &state, None);
        }
        if let Some(profile) = self.profiles.get_mut("exif") {
            status &= exif::sync(profile.data_mut(), &state);
        }
        if let Some(profile) = self.profiles.get_mut("xmp") {
            xmp::sync(profile.data_mut(), &state);
        }
        debug!(status, "synced profiles");
        status
    }

    /// Map clipping paths from a `old_columns` x `old_rows` canvas into
    /// `geometry` after a crop or resize
    pub fn remap_clip_paths(
        &mut self,
        old_columns: usize,
        old_rows: usize,
        geometry: RectangleInfo,
    ) {
        let state = MetadataState::of(self);
        let clip = ClipRemap {
            old_columns,
            old_rows,
            geometry,
        };
        if let Some(block) = self.profiles.get_mut("8bim") {
            eightbim::sync(block.data_mut(), &state, Some(&clip));
        }
    }
}
