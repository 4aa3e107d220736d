//! Edge case and error handling tests for imageops-cutout
//!
//! Covers the boundaries of the pipeline: unusable inputs, invalid
//! configuration, degenerate image sizes and misbehaving segmenters.

use image::{DynamicImage, Luma, Rgb, RgbImage, Rgba, RgbaImage};
use imageops_cutout::{
    remove_background, remove_background_with, AlphaChannel, AlphaMaskError, ConfigError, Error,
    FusionWeights, HeuristicSegmenter, ImageSource, MattingConfig, ModifyAlpha, RemoveBackground,
    RemoveBackgroundMut, SegmentationStrategy, Segmenter, StrategyChain, Unavailable,
};

fn seeded_config() -> MattingConfig {
    MattingConfig::default().with_seed(5)
}

/// Segmenter that ignores the image size
struct WrongSize;

impl Segmenter for WrongSize {
    fn segment(&self, _image: &RgbaImage) -> Result<AlphaChannel, Error> {
        Ok(AlphaChannel::from_pixel(3, 3, Luma([255])))
    }
}

struct WrongSizeStrategy;

impl SegmentationStrategy for WrongSizeStrategy {
    fn name(&self) -> &str {
        "wrong-size"
    }

    fn try_segmenter(&self) -> Result<Box<dyn Segmenter>, Unavailable> {
        Ok(Box::new(WrongSize))
    }
}

mod input_errors {
    use super::*;

    #[test]
    fn test_empty_bitmap_is_rejected() {
        let source = ImageSource::from(RgbaImage::new(0, 0));
        assert!(matches!(
            remove_background(source),
            Err(Error::EmptyImage { width: 0, height: 0 })
        ));
    }

    #[test]
    fn test_zero_height_bitmap_is_rejected() {
        let result = RgbaImage::new(10, 0).remove_background(&seeded_config());
        assert!(matches!(result, Err(Error::EmptyImage { width: 10, height: 0 })));
    }

    #[test]
    fn test_garbage_bytes_are_a_decode_error() {
        let source = ImageSource::Bytes(b"definitely not an image".to_vec());
        assert!(matches!(remove_background(source), Err(Error::Decode(_))));
    }

    #[test]
    fn test_empty_bytes_are_a_decode_error() {
        assert!(matches!(
            remove_background(ImageSource::Bytes(Vec::new())),
            Err(Error::Decode(_))
        ));
    }

    #[test]
    fn test_remote_uri_is_unsupported() {
        let source = ImageSource::Uri("https://example.com/cat.png".into());
        match remove_background(source) {
            Err(Error::UnsupportedUri(uri)) => assert_eq!(uri, "https://example.com/cat.png"),
            other => panic!("expected UnsupportedUri, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_file_is_an_io_error() {
        let source = ImageSource::Uri("file:///no/such/dir/input.png".into());
        assert!(matches!(remove_background(source), Err(Error::Io(_))));
    }
}

mod config_errors {
    use super::*;

    #[test]
    fn test_zero_clusters() {
        let result = HeuristicSegmenter::new(seeded_config().with_max_clusters(0));
        assert!(matches!(
            result,
            Err(Error::InvalidConfig(ConfigError::InvalidClusterCount(0)))
        ));
    }

    #[test]
    fn test_zero_iterations() {
        let result = HeuristicSegmenter::new(seeded_config().with_max_iterations(0));
        assert!(matches!(
            result,
            Err(Error::InvalidConfig(ConfigError::InvalidIterationCount(0)))
        ));
    }

    #[test]
    fn test_negative_steepness() {
        let result = StrategyChain::new(seeded_config().with_sigmoid_steepness(-1.0));
        assert!(matches!(
            result,
            Err(Error::InvalidConfig(ConfigError::InvalidParameter {
                name: "sigmoid_steepness",
                ..
            }))
        ));
    }

    #[test]
    fn test_nan_fusion_weight() {
        let weights = FusionWeights {
            edge: f32::NAN,
            ..FusionWeights::default()
        };
        let result = HeuristicSegmenter::new(seeded_config().with_fusion_weights(weights));
        assert!(matches!(
            result,
            Err(Error::InvalidConfig(ConfigError::InvalidParameter { .. }))
        ));
    }

    #[test]
    fn test_all_zero_fusion_weights() {
        let weights = FusionWeights {
            subject: 0.0,
            edge: 0.0,
            color_distance: 0.0,
            texture: 0.0,
        };
        let result = RgbImage::from_pixel(4, 4, Rgb([1, 2, 3]))
            .remove_background(&seeded_config().with_fusion_weights(weights));
        assert!(matches!(
            result,
            Err(Error::InvalidConfig(ConfigError::ZeroFusionWeights))
        ));
    }
}

mod degenerate_sizes {
    use super::*;

    #[test]
    fn test_single_pixel() {
        let png = remove_background(ImageSource::from(RgbaImage::from_pixel(
            1,
            1,
            Rgba([12, 34, 56, 255]),
        )))
        .unwrap();
        let decoded = image::load_from_memory(&png).unwrap().into_rgba8();
        assert_eq!(decoded.dimensions(), (1, 1));
        assert_eq!(&decoded.get_pixel(0, 0).0[..3], &[12, 34, 56]);
    }

    #[test]
    fn test_single_row_and_column() {
        for (width, height) in [(37, 1), (1, 29), (2, 2), (3, 2)] {
            let image = RgbaImage::from_fn(width, height, |x, y| {
                Rgba([(x * 7) as u8, (y * 9) as u8, 100, 255])
            });
            let cutout = image.remove_background(&seeded_config()).unwrap();
            assert_eq!(cutout.dimensions(), (width, height));
        }
    }

    #[test]
    fn test_uniform_image_has_no_foreground() {
        let mut image = RgbaImage::from_pixel(40, 30, Rgba([255, 255, 255, 255]));
        image.remove_background_mut(&seeded_config()).unwrap();
        assert!(image.pixels().all(|p| p[3] == 0));
    }

    #[test]
    fn test_translucent_input_alpha_is_replaced() {
        let image = RgbaImage::from_pixel(16, 16, Rgba([250, 250, 250, 3]));
        let source = ImageSource::Bitmap(DynamicImage::ImageRgba8(image));
        let png = remove_background(source).unwrap();
        let decoded = image::load_from_memory(&png).unwrap().into_rgba8();
        assert!(decoded.pixels().all(|p| p.0[..3] == [250, 250, 250]));
    }
}

mod alpha_mismatch {
    use super::*;

    #[test]
    fn test_replace_alpha_with_wrong_mask() {
        let image = RgbaImage::new(4, 4);
        let mask = AlphaChannel::new(4, 5);
        assert_eq!(
            image.replace_alpha(&mask).unwrap_err(),
            AlphaMaskError::DimensionMismatch {
                expected: (4, 4),
                actual: (4, 5),
            }
        );
    }

    #[test]
    fn test_segmenter_with_wrong_output_size() {
        let chain = StrategyChain::default().with_strategy(WrongSizeStrategy);
        let source = ImageSource::from(RgbaImage::from_pixel(8, 8, Rgba([0, 0, 0, 255])));
        assert!(matches!(
            remove_background_with(&chain, source),
            Err(Error::AlphaMask(AlphaMaskError::DimensionMismatch {
                expected: (8, 8),
                actual: (3, 3),
            }))
        ));
    }
}
