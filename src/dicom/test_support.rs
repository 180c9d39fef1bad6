//! In-memory DICOM files for unit tests

use super::Dataset;
use dicom::core::{DataElement, PrimitiveValue, Tag, VR};
use dicom::dictionary_std::{tags, uids};
use dicom::object::{FileMetaTableBuilder, InMemDicomObject};

pub(crate) struct DatasetBuilder {
    obj: InMemDicomObject,
    transfer_syntax: &'static str,
}

impl DatasetBuilder {
    pub(crate) fn new() -> Self {
        let mut builder = Self {
            obj: InMemDicomObject::new_empty(),
            transfer_syntax: uids::EXPLICIT_VR_LITTLE_ENDIAN,
        };
        builder.put(tags::SOP_CLASS_UID, VR::UI, uids::SECONDARY_CAPTURE_IMAGE_STORAGE.into());
        builder.put(tags::SOP_INSTANCE_UID, VR::UI, "2.25.1".into());
        builder
    }

    fn put(&mut self, tag: Tag, vr: VR, value: PrimitiveValue) {
        self.obj.put(DataElement::new(tag, vr, value));
    }

    pub(crate) fn u16(mut self, tag: Tag, value: u16) -> Self {
        self.put(tag, VR::US, PrimitiveValue::from(value));
        self
    }

    pub(crate) fn text(mut self, tag: Tag, value: &str) -> Self {
        self.put(tag, VR::LO, PrimitiveValue::from(value));
        self
    }

    pub(crate) fn decimal(mut self, tag: Tag, value: &str) -> Self {
        self.put(tag, VR::DS, PrimitiveValue::from(value));
        self
    }

    pub(crate) fn pixel_bytes(mut self, bytes: Vec<u8>) -> Self {
        self.put(tags::PIXEL_DATA, VR::OB, PrimitiveValue::from(bytes));
        self
    }

    /// Unsigned 8-bit MONOCHROME2 image
    pub(crate) fn image_8bit(self, rows: u16, cols: u16, samples: Vec<u8>) -> Self {
        self.u16(tags::ROWS, rows)
            .u16(tags::COLUMNS, cols)
            .u16(tags::SAMPLES_PER_PIXEL, 1)
            .u16(tags::BITS_ALLOCATED, 8)
            .u16(tags::BITS_STORED, 8)
            .u16(tags::HIGH_BIT, 7)
            .u16(tags::PIXEL_REPRESENTATION, 0)
            .text(tags::PHOTOMETRIC_INTERPRETATION, "MONOCHROME2")
            .pixel_bytes(samples)
    }

    /// 16-bit MONOCHROME2 image, samples stored little-endian in an OW element
    pub(crate) fn image_16bit(self, rows: u16, cols: u16, samples: Vec<u16>, signed: bool) -> Self {
        let bytes: Vec<u8> = samples.iter().flat_map(|s| s.to_le_bytes()).collect();
        let mut builder = self
            .u16(tags::ROWS, rows)
            .u16(tags::COLUMNS, cols)
            .u16(tags::SAMPLES_PER_PIXEL, 1)
            .u16(tags::BITS_ALLOCATED, 16)
            .u16(tags::BITS_STORED, 16)
            .u16(tags::HIGH_BIT, 15)
            .u16(tags::PIXEL_REPRESENTATION, u16::from(signed))
            .text(tags::PHOTOMETRIC_INTERPRETATION, "MONOCHROME2");
        builder.put(tags::PIXEL_DATA, VR::OW, PrimitiveValue::from(bytes));
        builder
    }

    pub(crate) fn build_object(self) -> Dataset {
        let meta = FileMetaTableBuilder::new()
            .transfer_syntax(self.transfer_syntax)
            .media_storage_sop_class_uid(uids::SECONDARY_CAPTURE_IMAGE_STORAGE)
            .media_storage_sop_instance_uid("2.25.1");
        self.obj.with_meta(meta).expect("valid file meta group")
    }

    /// Complete Part 10 file bytes, preamble included
    pub(crate) fn build_bytes(self) -> Vec<u8> {
        let file = self.build_object();
        let mut bytes = vec![0_u8; 128];
        let mut body = Vec::new();
        file.write_all(&mut body).expect("write in-memory DICOM file");
        // `write_all` emits the preamble itself in some releases
        if body.len() > 132 && &body[128..132] == b"DICM" {
            return body;
        }
        bytes.extend(body);
        bytes
    }
}
