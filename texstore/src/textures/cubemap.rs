use crate::context::{
    CubeFace, GraphicsContext, ImageTarget, ImageUpload, ParameterName, ParameterValue,
    TextureTarget,
};
use crate::error::{InvalidDescriptorErr, Result};
use crate::source::Surface;
use crate::textures::surface::{fit_within, fit_within_owned, grid_cell};
use crate::textures::{
    CUBE_MAP_PLACEHOLDER, MipmapPolicy, TextureBase, TextureKind, impl_texture_resource,
};
use image::RgbaImage;
use image::imageops::FilterType;
use itertools::Itertools;
use smallvec::SmallVec;
use snafu::ensure;
use std::borrow::Cow;
use texstore_utils::{OrderedIndex, debug_panic};
use tracing::{debug, warn};

/// Cell of each face inside a 4×3 cross atlas, in [`CubeFace`] order.
///
/// ```text
/// +--+--+--+--+
/// |  |PY|  |  |
/// +--+--+--+--+
/// |NX|PZ|PX|NZ|
/// +--+--+--+--+
/// |  |NY|  |  |
/// +--+--+--+--+
/// ```
pub const CROSS_OFFSETS: [(u32, u32); 6] = [(2, 1), (0, 1), (1, 0), (1, 2), (1, 1), (3, 1)];

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum CubeLayout {
    /// No images, e.g. for render targets. Shows a 1×1 placeholder; the edge length is kept
    /// for the host.
    Sized(u32),
    /// A single cross-shaped atlas.
    Cross,
    /// Six separate images.
    Separate,
}

/// One declared source image of a cube map.
#[derive(Debug, Clone)]
pub struct FaceRecord {
    pub url: String,
    image: Option<Surface>,
    loaded: bool,
}

impl FaceRecord {
    fn new(url: String) -> Self {
        Self {
            url,
            image: None,
            loaded: false,
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn image(&self) -> Option<&Surface> {
        self.image.as_ref()
    }
}

/// How a cube map prepares and fills its faces.
#[derive(Debug, Copy, Clone)]
pub struct CubeMapConfig {
    /// Faces larger than this are scaled down.
    pub max_size: u32,
    pub placeholder: [u8; 4],
    pub resize_filter: FilterType,
}

impl Default for CubeMapConfig {
    fn default() -> Self {
        Self {
            max_size: 4096,
            placeholder: CUBE_MAP_PLACEHOLDER,
            resize_filter: FilterType::Triangle,
        }
    }
}

/// A cube map texture.
///
/// Until every declared face is loaded all six targets show the placeholder color. The
/// real faces are then uploaded together, so the texture never mixes real and placeholder
/// faces.
#[derive(Debug)]
pub struct CubeMap {
    base: TextureBase,
    layout: CubeLayout,
    faces: SmallVec<[FaceRecord; 6]>,
    config: CubeMapConfig,
}

impl_texture_resource!(CubeMap, TextureKind::CubeMap);

impl CubeMap {
    /// A cube map without source images.
    pub fn sized<C: GraphicsContext + ?Sized>(
        ctx: &mut C,
        size: u32,
        config: CubeMapConfig,
    ) -> Result<Self> {
        ensure!(
            size > 0,
            InvalidDescriptorErr {
                reason: "cube map size must be positive"
            }
        );

        let size = if size > config.max_size {
            warn!(
                "[Cube Map] Requested size {size} exceeds the maximum of {}, clamping",
                config.max_size
            );
            config.max_size
        } else {
            size
        };

        Self::create(ctx, CubeLayout::Sized(size), SmallVec::new(), config)
    }

    /// A cube map from one cross atlas or six separate faces.
    pub fn from_urls<C: GraphicsContext + ?Sized>(
        ctx: &mut C,
        urls: &[String],
        config: CubeMapConfig,
    ) -> Result<Self> {
        let layout = match urls.len() {
            1 => CubeLayout::Cross,
            6 => CubeLayout::Separate,
            count => {
                return InvalidDescriptorErr {
                    reason: format!("a cube map needs 1 or 6 urls, got {count}"),
                }
                .fail();
            }
        };

        let faces = urls.iter().cloned().map(FaceRecord::new).collect();
        Self::create(ctx, layout, faces, config)
    }

    fn create<C: GraphicsContext + ?Sized>(
        ctx: &mut C,
        layout: CubeLayout,
        faces: SmallVec<[FaceRecord; 6]>,
        config: CubeMapConfig,
    ) -> Result<Self> {
        let mut cube = Self {
            base: TextureBase::create(ctx, TextureTarget::CubeMap)?,
            layout,
            faces,
            config,
        };

        cube.base.bind(ctx);
        for (name, value) in [
            (ParameterName::MagFilter, ParameterValue::Linear),
            (ParameterName::WrapS, ParameterValue::ClampToEdge),
            (ParameterName::WrapT, ParameterValue::ClampToEdge),
        ] {
            cube.base.set_if_absent(ctx, name, value);
        }

        cube.upload_all(ctx);
        Ok(cube)
    }

    pub fn layout(&self) -> CubeLayout {
        self.layout
    }

    pub fn faces(&self) -> &[FaceRecord] {
        &self.faces
    }

    /// Vacuously true for size-only cube maps.
    pub fn all_faces_loaded(&self) -> bool {
        self.faces.iter().all(FaceRecord::is_loaded)
    }

    /// Records a loaded source image.
    ///
    /// Returns `true` if this was the last missing face, in which case all six targets have
    /// just been uploaded.
    pub fn on_face_loaded<C: GraphicsContext + ?Sized>(
        &mut self,
        ctx: &mut C,
        index: usize,
        image: Surface,
    ) -> bool {
        let was_complete = self.all_faces_loaded();
        let Some(face) = self.faces.get_mut(index) else {
            debug_panic!(
                "[Cube Map] Face {index} loaded for a cube map with {} faces",
                self.faces.len()
            );
            return false;
        };

        face.image = Some(image);
        face.loaded = true;

        if was_complete || !self.all_faces_loaded() {
            return false;
        }

        debug!(
            "[Cube Map] All faces of texture {} loaded",
            self.base.handle().raw()
        );
        self.upload_all(ctx);
        true
    }

    /// Fills all six targets: real images if every face is in, the placeholder otherwise.
    pub fn upload_all<C: GraphicsContext + ?Sized>(&mut self, ctx: &mut C) {
        self.base.bind(ctx);

        let (width, height) = match self.prepared_faces() {
            Some(faces) => {
                ctx.set_unpack_flip_y(false);
                for (face, image) in CubeFace::ALL.iter().zip(&faces) {
                    ctx.tex_image_2d(ImageTarget::Face(*face), &ImageUpload::from_image(image));
                }
                faces[0].dimensions()
            }
            None => {
                // always 1×1, a sized cube only records its edge length
                let placeholder = self.config.placeholder;
                for face in CubeFace::ALL {
                    let upload = ImageUpload::pixel(&placeholder);
                    ctx.tex_image_2d(ImageTarget::Face(*face), &upload);
                }
                (1, 1)
            }
        };

        if MipmapPolicy::allows_mipmaps(width, height) {
            ctx.generate_mipmap(TextureTarget::CubeMap);
            self.base
                .set_if_absent(ctx, ParameterName::MinFilter, ParameterValue::LinearMipmapLinear);
        } else {
            self.base
                .set_if_absent(ctx, ParameterName::MinFilter, ParameterValue::Linear);
        }
    }

    /// The six images to upload, cut and scaled. `None` while anything is missing.
    fn prepared_faces(&self) -> Option<SmallVec<[Cow<'_, RgbaImage>; 6]>> {
        if self.faces.is_empty() || !self.all_faces_loaded() {
            return None;
        }

        let max = self.config.max_size;
        let filter = self.config.resize_filter;

        match self.layout {
            CubeLayout::Sized(_) => None,
            CubeLayout::Cross => {
                let atlas = self.faces.first()?.image.as_ref()?;
                if atlas.width() < 4 || atlas.height() < 3 {
                    warn!(
                        "[Cube Map] Cross atlas {} is {}x{}, too small to hold six faces",
                        self.faces[0].url,
                        atlas.width(),
                        atlas.height()
                    );
                    return None;
                }

                let faces = CROSS_OFFSETS
                    .iter()
                    .map(|&cell| {
                        let face = grid_cell(atlas, 4, 3, cell);
                        Cow::Owned(fit_within_owned(face, max, filter))
                    })
                    .collect();
                Some(faces)
            }
            CubeLayout::Separate => {
                let images: SmallVec<[&Surface; 6]> = self
                    .faces
                    .iter()
                    .filter_map(|face| face.image.as_ref())
                    .collect();
                if images.len() != CubeFace::COUNT {
                    return None;
                }

                if !images.iter().map(|image| image.dimensions()).all_equal() {
                    warn!(
                        "[Cube Map] Faces of {} have different sizes: {:?}",
                        self.faces.iter().map(|face| &face.url).join(","),
                        images.iter().map(|image| image.dimensions()).collect_vec()
                    );
                }

                let faces = images
                    .into_iter()
                    .map(|image| fit_within(image, max, filter))
                    .collect();
                Some(faces)
            }
        }
    }
}
