// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Watermark images: decoded once with the `image` crate and registered as an
// image XObject in the output document.

use std::path::Path;

use image::{ColorType, DynamicImage, ImageFormat};
use kopierwerk_core::error::KopierwerkError;
use lopdf::{Document, ObjectId, Stream, dictionary};
use tracing::{debug, instrument};

#[derive(Debug, Clone)]
enum Samples {
    /// Baseline JPEG data copied unchanged behind `/DCTDecode`.
    Jpeg { data: Vec<u8>, color_space: &'static str },
    /// Uncompressed 8-bit samples; the output writer deflates them.
    Raw {
        data: Vec<u8>,
        color_space: &'static str,
        alpha: Option<Vec<u8>>,
    },
}

/// A decoded watermark image. One image pixel is drawn as one point.
#[derive(Debug, Clone)]
pub struct WatermarkImage {
    width: u32,
    height: u32,
    samples: Samples,
}

impl WatermarkImage {
    /// Read and decode a PNG or JPEG watermark image.
    #[instrument(skip_all, fields(path = %path.display()))]
    pub fn open(path: &Path) -> Result<Self, KopierwerkError> {
        let bytes = std::fs::read(path).map_err(|err| {
            KopierwerkError::ImageError(format!("cannot read {}: {err}", path.display()))
        })?;
        Self::from_bytes(bytes)
    }

    /// Decode an image held in memory. Greyscale and RGB JPEGs are kept as
    /// DCT data; everything else becomes 8-bit samples with an optional
    /// alpha mask.
    ///
    /// # Errors
    ///
    /// Returns [`KopierwerkError::ImageError`] for unknown formats, decode
    /// failures and images without pixels.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, KopierwerkError> {
        let format = image::guess_format(&bytes)
            .map_err(|err| KopierwerkError::ImageError(format!("unknown image format: {err}")))?;
        let decoded = image::load_from_memory_with_format(&bytes, format)
            .map_err(|err| KopierwerkError::ImageError(format!("failed to decode image: {err}")))?;

        let (width, height) = (decoded.width(), decoded.height());
        if width == 0 || height == 0 {
            return Err(KopierwerkError::ImageError("image has no pixels".into()));
        }

        let samples = match (format, decoded.color()) {
            (ImageFormat::Jpeg, ColorType::L8) => Samples::Jpeg {
                data: bytes,
                color_space: "DeviceGray",
            },
            (ImageFormat::Jpeg, ColorType::Rgb8) => Samples::Jpeg {
                data: bytes,
                color_space: "DeviceRGB",
            },
            _ => raw_samples(&decoded),
        };

        debug!(width, height, ?format, "Watermark image decoded");
        Ok(Self {
            width,
            height,
            samples,
        })
    }

    /// Width in points.
    pub fn width(&self) -> f64 {
        f64::from(self.width)
    }

    /// Height in points.
    pub fn height(&self) -> f64 {
        f64::from(self.height)
    }

    /// Whether an `/SMask` will be written with the image.
    pub fn has_alpha(&self) -> bool {
        matches!(&self.samples, Samples::Raw { alpha: Some(_), .. })
    }

    /// Add the image XObject (and its soft mask, if any) to `document`.
    pub fn register(&self, document: &mut Document) -> ObjectId {
        let width = i64::from(self.width);
        let height = i64::from(self.height);

        match &self.samples {
            Samples::Jpeg { data, color_space } => {
                let mut stream = Stream::new(
                    dictionary! {
                        "Type" => "XObject",
                        "Subtype" => "Image",
                        "Width" => width,
                        "Height" => height,
                        "ColorSpace" => *color_space,
                        "BitsPerComponent" => 8,
                        "Filter" => "DCTDecode",
                    },
                    data.clone(),
                );
                stream.allows_compression = false;
                document.add_object(stream)
            }
            Samples::Raw {
                data,
                color_space,
                alpha,
            } => {
                let mut dict = dictionary! {
                    "Type" => "XObject",
                    "Subtype" => "Image",
                    "Width" => width,
                    "Height" => height,
                    "ColorSpace" => *color_space,
                    "BitsPerComponent" => 8,
                };
                if let Some(alpha) = alpha {
                    let mask_id = document.add_object(Stream::new(
                        dictionary! {
                            "Type" => "XObject",
                            "Subtype" => "Image",
                            "Width" => width,
                            "Height" => height,
                            "ColorSpace" => "DeviceGray",
                            "BitsPerComponent" => 8,
                        },
                        alpha.clone(),
                    ));
                    dict.set("SMask", mask_id);
                }
                document.add_object(Stream::new(dict, data.clone()))
            }
        }
    }
}

fn raw_samples(decoded: &DynamicImage) -> Samples {
    let color = decoded.color();
    let grey = matches!(
        color,
        ColorType::L8 | ColorType::La8 | ColorType::L16 | ColorType::La16
    );

    match (grey, color.has_alpha()) {
        (true, false) => Samples::Raw {
            data: decoded.to_luma8().into_raw(),
            color_space: "DeviceGray",
            alpha: None,
        },
        (true, true) => {
            let (data, alpha) = split_alpha(decoded.to_luma_alpha8().into_raw(), 1);
            Samples::Raw {
                data,
                color_space: "DeviceGray",
                alpha: Some(alpha),
            }
        }
        (false, false) => Samples::Raw {
            data: decoded.to_rgb8().into_raw(),
            color_space: "DeviceRGB",
            alpha: None,
        },
        (false, true) => {
            let (data, alpha) = split_alpha(decoded.to_rgba8().into_raw(), 3);
            Samples::Raw {
                data,
                color_space: "DeviceRGB",
                alpha: Some(alpha),
            }
        }
    }
}

/// Split interleaved `channels + 1`-byte pixels into colour and alpha planes.
fn split_alpha(pixels: Vec<u8>, channels: usize) -> (Vec<u8>, Vec<u8>) {
    let stride = channels + 1;
    let count = pixels.len() / stride;
    let mut colour = Vec::with_capacity(count * channels);
    let mut alpha = Vec::with_capacity(count);
    for pixel in pixels.chunks_exact(stride) {
        colour.extend_from_slice(&pixel[..channels]);
        alpha.push(pixel[channels]);
    }
    (colour, alpha)
}
