use image::{GrayImage, Luma};

use xrfalign_core::error::XrfAlignError;
use xrfalign_core::io::alignment_file::{
    format_alignment_table, load_alignment_file, parse_alignment_table, save_alignment_file,
    AlignmentEntry, AlignmentTable,
};
use xrfalign_core::io::image_stack::load_image_stack;
use xrfalign_core::io::theta_file::{load_theta_file, parse_theta_table};
use xrfalign_core::shift::ShiftVectors;

#[test]
fn test_theta_single_column() {
    let table = parse_theta_table("theta\n-90.0\n-88.5\n\n-87\n").unwrap();
    assert_eq!(table.angles, vec![-90.0, -88.5, -87.0]);
    assert!(!table.has_filenames());
}

#[test]
fn test_theta_with_filenames() {
    let table = parse_theta_table("filename,theta\nscan_1.h5, 10.5\nscan_2.h5,12\n").unwrap();
    assert_eq!(table.filenames, vec!["scan_1.h5", "scan_2.h5"]);
    assert_eq!(table.angles, vec![10.5, 12.0]);
}

#[test]
fn test_theta_angles_for_falls_back_to_order() {
    let table = parse_theta_table("filename,theta\nx.h5,1\ny.h5,2\n").unwrap();
    let names = vec!["a.tif".to_string(), "y.tif".to_string()];
    assert_eq!(table.angles_for(&names).unwrap(), vec![1.0, 2.0]);

    let three = vec!["a.tif".to_string(), "b.tif".to_string(), "c.tif".to_string()];
    assert!(matches!(
        table.angles_for(&three),
        Err(XrfAlignError::InvalidThetaFile(_))
    ));
}

#[test]
fn test_theta_errors() {
    assert!(matches!(
        parse_theta_table(""),
        Err(XrfAlignError::InvalidThetaFile(_))
    ));
    assert!(matches!(
        parse_theta_table("theta\n"),
        Err(XrfAlignError::InvalidThetaFile(_))
    ));
    assert!(matches!(
        parse_theta_table("theta\nabc\n"),
        Err(XrfAlignError::InvalidThetaFile(_))
    ));
    assert!(matches!(
        parse_theta_table("a,b,c\n1,2,3\n"),
        Err(XrfAlignError::InvalidThetaFile(_))
    ));
}

#[test]
fn test_theta_file_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("thetas.txt");
    std::fs::write(&path, "theta\n0\n90\n").unwrap();
    assert_eq!(load_theta_file(&path).unwrap().angles, vec![0.0, 90.0]);
    assert!(matches!(
        load_theta_file(&dir.path().join("missing.txt")),
        Err(XrfAlignError::Io(_))
    ));
}

#[test]
fn test_alignment_format() {
    let table = AlignmentTable::from_shifts(
        &["a.tif".into(), "b.tif".into()],
        &ShiftVectors {
            x: vec![0, -3],
            y: vec![0, 2],
        },
        Some(63.5),
    )
    .unwrap();
    assert_eq!(
        format_alignment_table(&table),
        "filename,x_shift,y_shift\na.tif,0,0\nb.tif,-3,2\nrotation_axis,63.5\n"
    );
}

#[test]
fn test_alignment_file_roundtrip_on_disk() {
    let table = AlignmentTable {
        entries: vec![
            AlignmentEntry {
                filename: "scan,1.h5".into(),
                x_shift: 4,
                y_shift: -1,
            },
            AlignmentEntry {
                filename: "scan_2.h5".into(),
                x_shift: 0,
                y_shift: 7,
            },
        ],
        rotation_center: None,
    };
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("alignment.csv");
    save_alignment_file(&table, &path).unwrap();
    assert_eq!(load_alignment_file(&path).unwrap(), table);
}

#[test]
fn test_alignment_parse_variants() {
    let table = parse_alignment_table("a.tif,1.0,2.0\nrotation axis,40\n").unwrap();
    assert_eq!(table.entries[0].x_shift, 1);
    assert_eq!(table.entries[0].y_shift, 2);
    assert_eq!(table.rotation_center, Some(40.0));
    assert_eq!(table.find("a.tif").map(|e| e.x_shift), Some(1));
    assert!(table.find("b.tif").is_none());
}

#[test]
fn test_alignment_parse_errors() {
    assert!(matches!(
        parse_alignment_table("filename,x_shift,y_shift\nonly_two,1\n"),
        Err(XrfAlignError::InvalidAlignmentFile(_))
    ));
    assert!(matches!(
        parse_alignment_table("a.tif,x,2\n"),
        Err(XrfAlignError::InvalidAlignmentFile(_))
    ));
}

#[test]
fn test_alignment_from_shifts_length_check() {
    assert!(matches!(
        AlignmentTable::from_shifts(&["a".into()], &ShiftVectors::zeros(2), None),
        Err(XrfAlignError::DimensionMismatch { .. })
    ));
}

fn write_gray(path: &std::path::Path, width: u32, height: u32, value: u8) {
    let img = GrayImage::from_fn(width, height, |x, y| Luma([value.wrapping_add((x + y) as u8)]));
    img.save(path).unwrap();
}

#[test]
fn test_load_image_stack_channels() {
    let dir = tempfile::tempdir().unwrap();
    for (channel, scale) in [("Fe", 10u8), ("Zn", 100u8)] {
        let channel_dir = dir.path().join(channel);
        std::fs::create_dir(&channel_dir).unwrap();
        for i in 0..3u8 {
            write_gray(&channel_dir.join(format!("proj_{i:03}.png")), 5, 4, scale + i);
        }
        std::fs::write(channel_dir.join("notes.txt"), "ignored").unwrap();
    }

    let loaded = load_image_stack(dir.path()).unwrap();
    assert_eq!(loaded.channel_names, vec!["Fe", "Zn"]);
    assert_eq!(loaded.filenames, vec!["proj_000.png", "proj_001.png", "proj_002.png"]);
    let stack = &loaded.stack;
    assert_eq!(
        (stack.channels(), stack.projections(), stack.height(), stack.width()),
        (2, 3, 4, 5)
    );
    let fe = stack.projection(0, 1).unwrap();
    assert!((fe[[0, 0]] - 11.0 / 255.0).abs() < 1e-6);
    assert!((fe[[3, 4]] - 18.0 / 255.0).abs() < 1e-6);
    let zn = stack.projection(1, 2).unwrap();
    assert!((zn[[0, 0]] - 102.0 / 255.0).abs() < 1e-6);
}

#[test]
fn test_load_image_stack_flat_directory() {
    let dir = tempfile::tempdir().unwrap();
    write_gray(&dir.path().join("b.png"), 3, 3, 20);
    write_gray(&dir.path().join("a.png"), 3, 3, 10);
    let loaded = load_image_stack(dir.path()).unwrap();
    assert_eq!(loaded.stack.channels(), 1);
    assert_eq!(loaded.filenames, vec!["a.png", "b.png"]);
}

#[test]
fn test_load_image_stack_size_mismatch() {
    let dir = tempfile::tempdir().unwrap();
    write_gray(&dir.path().join("a.png"), 3, 3, 10);
    write_gray(&dir.path().join("b.png"), 4, 3, 10);
    assert!(matches!(
        load_image_stack(dir.path()),
        Err(XrfAlignError::DimensionMismatch { .. })
    ));
}

#[test]
fn test_load_image_stack_empty() {
    let dir = tempfile::tempdir().unwrap();
    assert!(matches!(
        load_image_stack(dir.path()),
        Err(XrfAlignError::EmptyStack)
    ));
}
