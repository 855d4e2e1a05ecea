// Sensor resolutions by wire name
//
// One table drives both directions of the mapping so names and variants
// cannot drift apart.

use std::fmt;

macro_rules! frame_sizes {
    ($($variant:ident => $name:literal, ($width:literal, $height:literal);)*) => {
        /// Resolutions the sensor can be switched to
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum FrameSize {
            $($variant,)*
            /// Any name not in the table. The camera rejects it.
            Invalid,
        }

        impl FrameSize {
            pub const ALL: &'static [FrameSize] = &[$(FrameSize::$variant,)*];

            pub fn name(self) -> &'static str {
                match self {
                    $(FrameSize::$variant => $name,)*
                    FrameSize::Invalid => "FRAMESIZE_INVALID",
                }
            }

            /// Width and height in pixels
            pub fn dimensions(self) -> Option<(u32, u32)> {
                match self {
                    $(FrameSize::$variant => Some(($width, $height)),)*
                    FrameSize::Invalid => None,
                }
            }

            /// Look up a wire name. Unknown names map to `Invalid`.
            pub fn from_name(name: &str) -> FrameSize {
                match name {
                    $($name => FrameSize::$variant,)*
                    _ => FrameSize::Invalid,
                }
            }
        }
    };
}

frame_sizes! {
    Size96x96 => "FRAMESIZE_96X96", (96, 96);
    Qqvga => "FRAMESIZE_QQVGA", (160, 120);
    Qcif => "FRAMESIZE_QCIF", (176, 144);
    Hqvga => "FRAMESIZE_HQVGA", (240, 176);
    Size240x240 => "FRAMESIZE_240X240", (240, 240);
    Qvga => "FRAMESIZE_QVGA", (320, 240);
    Cif => "FRAMESIZE_CIF", (400, 296);
    Hvga => "FRAMESIZE_HVGA", (480, 320);
    Vga => "FRAMESIZE_VGA", (640, 480);
    Svga => "FRAMESIZE_SVGA", (800, 600);
    Xga => "FRAMESIZE_XGA", (1024, 768);
    Hd => "FRAMESIZE_HD", (1280, 720);
    Sxga => "FRAMESIZE_SXGA", (1280, 1024);
    Uxga => "FRAMESIZE_UXGA", (1600, 1200);
    Fhd => "FRAMESIZE_FHD", (1920, 1080);
    PHd => "FRAMESIZE_P_HD", (720, 1280);
    P3mp => "FRAMESIZE_P_3MP", (864, 1536);
    Qxga => "FRAMESIZE_QXGA", (2048, 1536);
    Qhd => "FRAMESIZE_QHD", (2560, 1440);
    Wqxga => "FRAMESIZE_WQXGA", (2560, 1600);
    PFhd => "FRAMESIZE_P_FHD", (1080, 1920);
    Qsxga => "FRAMESIZE_QSXGA", (2560, 1920);
}

impl FrameSize {
    pub fn is_valid(self) -> bool {
        self != FrameSize::Invalid
    }
}

impl fmt::Display for FrameSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_name_maps_back() {
        assert_eq!(FrameSize::ALL.len(), 22);
        for &size in FrameSize::ALL {
            assert_eq!(FrameSize::from_name(size.name()), size);
            assert!(size.dimensions().is_some());
        }
    }

    #[test]
    fn test_unknown_names_are_invalid() {
        assert_eq!(FrameSize::from_name("BOGUS"), FrameSize::Invalid);
        assert_eq!(FrameSize::from_name("framesize_vga"), FrameSize::Invalid);
        assert_eq!(FrameSize::from_name(""), FrameSize::Invalid);
        assert!(!FrameSize::Invalid.is_valid());
        assert_eq!(FrameSize::Invalid.dimensions(), None);
    }

    #[test]
    fn test_vga() {
        assert_eq!(FrameSize::Vga.to_string(), "FRAMESIZE_VGA");
        assert_eq!(FrameSize::Vga.dimensions(), Some((640, 480)));
    }
}
