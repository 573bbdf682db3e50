use super::*;

#[test]
fn gray16_flips_rows_and_applies_exposure() {
    let t = IntensityTexture::from_texels(2, 2, vec![0.25, 0.5, 1.0, 3.0]).unwrap();
    let g = intensity_to_gray16(&t, 2.0);
    assert_eq!(g, vec![65535, 65535, 32768, 65535]);
    assert_eq!(intensity_to_gray16(&IntensityTexture::new(2, 1).unwrap(), 1.0), vec![0, 0]);
}

#[test]
fn unpremultiply_restores_straight_colour() {
    let f = FrameRGBA {
        width: 2,
        height: 1,
        data: vec![64, 32, 0, 128, 9, 9, 9, 0],
        premultiplied: true,
    };
    assert_eq!(unpremultiply(&f), vec![128, 64, 0, 128, 0, 0, 0, 0]);
}

#[test]
fn png_files_round_trip_through_image() {
    let dir = std::env::temp_dir().join("reflective_caustics_export_test");
    std::fs::create_dir_all(&dir).unwrap();

    let t = IntensityTexture::from_texels(3, 2, vec![0.0, 0.5, 1.0, 0.0, 0.0, 0.0]).unwrap();
    let p = dir.join("intensity.png");
    write_intensity_png(&t, 1.0, &p).unwrap();
    let img = image::open(&p).unwrap().to_luma16();
    assert_eq!(img.dimensions(), (3, 2));
    assert_eq!(img.get_pixel(2, 1).0[0], 65535);

    let f = FrameRGBA::filled(2, 2, [10, 20, 30, 255]);
    let p = dir.join("frame.png");
    write_frame_png(&f, &p).unwrap();
    let img = image::open(&p).unwrap().to_rgba8();
    assert_eq!(img.get_pixel(1, 1).0, [10, 20, 30, 255]);
}
