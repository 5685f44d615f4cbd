//! NDA image03 descriptors written next to each mapping document.

use serde::{Deserialize, Serialize};

/// Datatypes with a known image03 descriptor.
// CT, SPECT, ultrasound, X-ray, spectroscopy, microscopy and fNIRS still need descriptors.
pub const SUPPORTED_DATATYPES: [&str; 2] = ["anat", "pet"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageDescriptor {
    pub image_description: String,
    pub scan_type: String,
    pub scan_object: String,
    pub image_modality: String,
    pub transformation_performed: String,
    pub image_file_format: String,
}

impl ImageDescriptor {
    /// Fixed descriptor for a BIDS datatype, or `None` if the datatype is unsupported.
    pub fn for_datatype(datatype: &str) -> Option<Self> {
        let (description, scan_type, modality) = match datatype {
            "anat" => ("anatomical", "MR structural (T1)", "MRI"),
            "pet" => ("PET", "PET", "PET"),
            _ => return None,
        };
        Some(Self {
            image_description: description.to_string(),
            scan_type: scan_type.to_string(),
            scan_object: "Live".to_string(),
            image_modality: modality.to_string(),
            transformation_performed: "No".to_string(),
            image_file_format: "DICOM".to_string(),
        })
    }
}
