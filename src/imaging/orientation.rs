//! EXIF orientation values and the pixel transforms that undo them.
//!
//! Cameras store pixels in sensor order and record how to display them in
//! EXIF tag 0x0112. Once the transform is baked into the pixels the tag must
//! go, otherwise viewers would rotate the image a second time.
//!
//! | Value | Meaning | Transform to upright |
//! |---|---|---|
//! | 1 | Normal | none |
//! | 2 | Mirrored | flip horizontal |
//! | 3 | Upside down | rotate 180° |
//! | 4 | Mirrored, upside down | flip vertical |
//! | 5 | Transposed | rotate 90° CW, flip horizontal |
//! | 6 | Rotated 90° CCW | rotate 90° CW |
//! | 7 | Transversed | rotate 270° CW, flip horizontal |
//! | 8 | Rotated 90° CW | rotate 270° CW |

use image::DynamicImage;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Orientation {
    #[default]
    Normal,
    FlipHorizontal,
    Rotate180,
    FlipVertical,
    Transpose,
    Rotate90,
    Transverse,
    Rotate270,
}

impl Orientation {
    /// Map an EXIF orientation value. Out-of-range values are `None`.
    pub fn from_exif(value: u16) -> Option<Self> {
        match value {
            1 => Some(Orientation::Normal),
            2 => Some(Orientation::FlipHorizontal),
            3 => Some(Orientation::Rotate180),
            4 => Some(Orientation::FlipVertical),
            5 => Some(Orientation::Transpose),
            6 => Some(Orientation::Rotate90),
            7 => Some(Orientation::Transverse),
            8 => Some(Orientation::Rotate270),
            _ => None,
        }
    }

    pub fn exif_value(self) -> u16 {
        match self {
            Orientation::Normal => 1,
            Orientation::FlipHorizontal => 2,
            Orientation::Rotate180 => 3,
            Orientation::FlipVertical => 4,
            Orientation::Transpose => 5,
            Orientation::Rotate90 => 6,
            Orientation::Transverse => 7,
            Orientation::Rotate270 => 8,
        }
    }

    /// Width and height trade places after the transform.
    pub fn swaps_dimensions(self) -> bool {
        matches!(
            self,
            Orientation::Transpose
                | Orientation::Rotate90
                | Orientation::Transverse
                | Orientation::Rotate270
        )
    }

    /// Return the image rotated/flipped so it displays upright with no tag.
    pub fn apply(self, img: DynamicImage) -> DynamicImage {
        match self {
            Orientation::Normal => img,
            Orientation::FlipHorizontal => img.fliph(),
            Orientation::Rotate180 => img.rotate180(),
            Orientation::FlipVertical => img.flipv(),
            Orientation::Transpose => img.rotate90().fliph(),
            Orientation::Rotate90 => img.rotate90(),
            Orientation::Transverse => img.rotate270().fliph(),
            Orientation::Rotate270 => img.rotate270(),
        }
    }
}
