use crate::dicom::DicomImage;
use crate::dicom::patient::format_date;
use crate::types::{UNKNOWN, WindowSettings};

pub fn print_metadata(image: &DicomImage, window: &WindowSettings) {
    let patient = &image.patient;
    print_field("Patient Name", &patient.name);
    print_field("Patient ID", &patient.id);
    print_field("Birth Date", &format_date(&patient.birth_date));
    print_field("Age", &patient.age);
    print_field("Sex", &patient.sex);
    print_field("Height", &patient.height);
    print_field("Weight", &patient.weight);

    let study = &image.study;
    print_field("Study Date", &format_date(&study.date));
    if let Some(modality) = &study.modality {
        print_field("Modality", modality);
    }
    print_field("Body Part", &study.body_part_examined);
    print_field("Patient Position", &study.patient_position);

    print_raster(image);
    print_rescale(image);
    println!("{:20}: {}", "Window", window);

    if let Some(sop_class) = &image.sop_class {
        println!("{:20}: {}", "SOP Class UID", sop_class);
    }
    println!("{:20}: {}", "Transfer Syntax", image.transfer_syntax);

    println!();
}

fn print_field(name: &str, value: &str) {
    if value != UNKNOWN {
        println!("{name:20}: {value}");
    }
}

fn print_raster(image: &DicomImage) {
    println!("{:20}: {} {}", "Raster", image.photometric.interpretation, image.geometry);
}

fn print_rescale(image: &DicomImage) {
    let photometric = &image.photometric;
    if photometric.rescale_type.is_empty() {
        println!("{:20}: {}", "Rescale", photometric.rescale);
    } else {
        println!("{:20}: {} ({})", "Rescale", photometric.rescale, photometric.rescale_type);
    }
}
