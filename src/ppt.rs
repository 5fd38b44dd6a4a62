//! PPT Report Generator Module
//! Packs chart PNGs into a PowerPoint deck: a title line and a 2x2 grid per slide.
//!
//! The OOXML parts are written straight into a ZIP container.

use std::fs::File;
use std::io::{BufWriter, Seek, Write};
use std::path::Path;
use thiserror::Error;
use zip::write::FileOptions;
use zip::ZipWriter;

#[derive(Error, Debug)]
pub enum PptError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("No images to place on slides")]
    NoImages,
}

/// EMU (English Metric Units) conversion: 914400 EMU = 1 inch
const EMU_PER_INCH: i64 = 914400;
/// 16:9 slide, 10 x 5.625 inches
const SLIDE_WIDTH: i64 = 9144000;
const SLIDE_HEIGHT: i64 = 5143500;
const MARGIN: i64 = EMU_PER_INCH / 4;
const GAP: i64 = EMU_PER_INCH / 8;
const TITLE_HEIGHT: i64 = EMU_PER_INCH / 2;

pub const IMAGES_PER_SLIDE: usize = 4;

const APP_NAME: &str = "finboard";

/// Picture frame on a slide, in EMU.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Frame {
    x: i64,
    y: i64,
    cx: i64,
    cy: i64,
}

/// PPT generator for the dashboard report
pub struct PptGenerator;

impl PptGenerator {
    /// Write the deck to `path`.
    pub fn generate_ppt_from_bytes(
        image_data: &[Vec<u8>],
        path: &Path,
        title: &str,
    ) -> Result<usize, PptError> {
        let file = BufWriter::new(File::create(path)?);
        let (mut file, slides) = Self::write_ppt(file, image_data, title)?;
        file.flush()?;
        Ok(slides)
    }

    /// Write the deck to any seekable writer. Returns the writer and the slide count.
    pub fn write_ppt<W: Write + Seek>(
        writer: W,
        image_data: &[Vec<u8>],
        title: &str,
    ) -> Result<(W, usize), PptError> {
        if image_data.is_empty() {
            return Err(PptError::NoImages);
        }

        let mut zip = ZipWriter::new(writer);
        let options = FileOptions::default();
        let slides: Vec<&[Vec<u8>]> = image_data.chunks(IMAGES_PER_SLIDE).collect();
        let slide_count = slides.len();
        let title = xml_escape(title);

        let package_parts: [(&str, String); 11] = [
            ("[Content_Types].xml", content_types_xml(slide_count)),
            ("_rels/.rels", ROOT_RELS_XML.to_string()),
            ("ppt/_rels/presentation.xml.rels", presentation_rels_xml(slide_count)),
            ("ppt/presentation.xml", presentation_xml(slide_count)),
            ("ppt/slideLayouts/slideLayout1.xml", SLIDE_LAYOUT_XML.to_string()),
            ("ppt/slideLayouts/_rels/slideLayout1.xml.rels", LAYOUT_RELS_XML.to_string()),
            ("ppt/slideMasters/slideMaster1.xml", SLIDE_MASTER_XML.to_string()),
            ("ppt/slideMasters/_rels/slideMaster1.xml.rels", MASTER_RELS_XML.to_string()),
            ("ppt/theme/theme1.xml", THEME_XML.to_string()),
            ("docProps/core.xml", core_props_xml(&title)),
            ("docProps/app.xml", app_props_xml(slide_count)),
        ];
        for (name, body) in &package_parts {
            zip.start_file(*name, options)?;
            zip.write_all(body.as_bytes())?;
        }

        let mut next_image = 1;
        for (idx, chunk) in slides.iter().enumerate() {
            let slide_num = idx + 1;
            let image_ids: Vec<usize> = (next_image..next_image + chunk.len()).collect();
            next_image += chunk.len();

            zip.start_file(format!("ppt/slides/_rels/slide{slide_num}.xml.rels"), options)?;
            zip.write_all(slide_rels_xml(&image_ids).as_bytes())?;

            let heading = if slide_count > 1 {
                format!("{title} ({slide_num}/{slide_count})")
            } else {
                title.clone()
            };
            zip.start_file(format!("ppt/slides/slide{slide_num}.xml"), options)?;
            zip.write_all(slide_xml(&heading, &grid_frames(chunk.len())).as_bytes())?;
        }

        for (idx, png) in image_data.iter().enumerate() {
            zip.start_file(format!("ppt/media/image{}.png", idx + 1), options)?;
            zip.write_all(png)?;
        }

        let writer = zip.finish()?;
        Ok((writer, slide_count))
    }
}

/// Up to four frames in a 2x2 grid below the title band, row by row.
fn grid_frames(count: usize) -> Vec<Frame> {
    let top = MARGIN + TITLE_HEIGHT;
    let cx = (SLIDE_WIDTH - 2 * MARGIN - GAP) / 2;
    let cy = (SLIDE_HEIGHT - top - MARGIN - GAP) / 2;
    (0..count.min(IMAGES_PER_SLIDE))
        .map(|i| {
            let (row, col) = ((i / 2) as i64, (i % 2) as i64);
            Frame {
                x: MARGIN + col * (cx + GAP),
                y: top + row * (cy + GAP),
                cx,
                cy,
            }
        })
        .collect()
}

fn xml_escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

const NS: &str = r#"xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main""#;
const REL_NS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";
const REL_TYPE: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const EMPTY_GROUP: &str = r#"<p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="0" cy="0"/><a:chOff x="0" y="0"/><a:chExt cx="0" cy="0"/></a:xfrm></p:grpSpPr>"#;

fn content_types_xml(slide_count: usize) -> String {
    let slides: String = (1..=slide_count)
        .map(|i| {
            format!(
                "<Override PartName=\"/ppt/slides/slide{i}.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.presentationml.slide+xml\"/>\n"
            )
        })
        .collect();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
<Default Extension="xml" ContentType="application/xml"/>
<Default Extension="png" ContentType="image/png"/>
<Override PartName="/ppt/presentation.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml"/>
<Override PartName="/ppt/slideMasters/slideMaster1.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slideMaster+xml"/>
<Override PartName="/ppt/slideLayouts/slideLayout1.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slideLayout+xml"/>
<Override PartName="/ppt/theme/theme1.xml" ContentType="application/vnd.openxmlformats-officedocument.theme+xml"/>
<Override PartName="/docProps/core.xml" ContentType="application/vnd.openxmlformats-package.core-properties+xml"/>
<Override PartName="/docProps/app.xml" ContentType="application/vnd.openxmlformats-officedocument.extended-properties+xml"/>
{slides}</Types>"#
    )
}

const ROOT_RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="ppt/presentation.xml"/>
<Relationship Id="rId2" Type="http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties" Target="docProps/core.xml"/>
<Relationship Id="rId3" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/extended-properties" Target="docProps/app.xml"/>
</Relationships>"#;

/// rId1 = master, rId2 = theme, slides from rId3.
fn presentation_rels_xml(slide_count: usize) -> String {
    let slides: String = (1..=slide_count)
        .map(|i| {
            format!(
                "<Relationship Id=\"rId{}\" Type=\"{REL_TYPE}/slide\" Target=\"slides/slide{i}.xml\"/>\n",
                i + 2
            )
        })
        .collect();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="{REL_NS}">
<Relationship Id="rId1" Type="{REL_TYPE}/slideMaster" Target="slideMasters/slideMaster1.xml"/>
<Relationship Id="rId2" Type="{REL_TYPE}/theme" Target="theme/theme1.xml"/>
{slides}</Relationships>"#
    )
}

fn presentation_xml(slide_count: usize) -> String {
    let slide_ids: String = (1..=slide_count)
        .map(|i| format!("<p:sldId id=\"{}\" r:id=\"rId{}\"/>", 255 + i, i + 2))
        .collect();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:presentation {NS} saveSubsetFonts="1">
<p:sldMasterIdLst><p:sldMasterId id="2147483648" r:id="rId1"/></p:sldMasterIdLst>
<p:sldIdLst>{slide_ids}</p:sldIdLst>
<p:sldSz cx="{SLIDE_WIDTH}" cy="{SLIDE_HEIGHT}" type="screen16x9"/>
<p:notesSz cx="{SLIDE_HEIGHT}" cy="{SLIDE_WIDTH}"/>
</p:presentation>"#
    )
}

/// rId1 = layout, images from rId2 in frame order.
fn slide_rels_xml(image_ids: &[usize]) -> String {
    let images: String = image_ids
        .iter()
        .enumerate()
        .map(|(idx, id)| {
            format!(
                "<Relationship Id=\"rId{}\" Type=\"{REL_TYPE}/image\" Target=\"../media/image{id}.png\"/>\n",
                idx + 2
            )
        })
        .collect();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="{REL_NS}">
<Relationship Id="rId1" Type="{REL_TYPE}/slideLayout" Target="../slideLayouts/slideLayout1.xml"/>
{images}</Relationships>"#
    )
}

fn slide_xml(heading: &str, frames: &[Frame]) -> String {
    let title_box = format!(
        r#"<p:sp><p:nvSpPr><p:cNvPr id="2" name="Title"/><p:cNvSpPr txBox="1"/><p:nvPr/></p:nvSpPr><p:spPr><a:xfrm><a:off x="{MARGIN}" y="{MARGIN}"/><a:ext cx="{}" cy="{TITLE_HEIGHT}"/></a:xfrm><a:prstGeom prst="rect"><a:avLst/></a:prstGeom></p:spPr><p:txBody><a:bodyPr anchor="ctr"/><a:lstStyle/><a:p><a:pPr algn="ctr"/><a:r><a:rPr lang="en-US" sz="2000" b="1"/><a:t>{heading}</a:t></a:r></a:p></p:txBody></p:sp>"#,
        SLIDE_WIDTH - 2 * MARGIN
    );

    let pictures: String = frames
        .iter()
        .enumerate()
        .map(|(idx, f)| {
            let shape_id = idx + 3;
            let r_id = idx + 2;
            format!(
                r#"
<p:pic><p:nvPicPr><p:cNvPr id="{shape_id}" name="Chart {}"/><p:cNvPicPr><a:picLocks noChangeAspect="1"/></p:cNvPicPr><p:nvPr/></p:nvPicPr><p:blipFill><a:blip r:embed="rId{r_id}"/><a:stretch><a:fillRect/></a:stretch></p:blipFill><p:spPr><a:xfrm><a:off x="{}" y="{}"/><a:ext cx="{}" cy="{}"/></a:xfrm><a:prstGeom prst="rect"><a:avLst/></a:prstGeom></p:spPr></p:pic>"#,
                idx + 1,
                f.x,
                f.y,
                f.cx,
                f.cy
            )
        })
        .collect();

    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:sld {NS}>
<p:cSld><p:spTree>{EMPTY_GROUP}
{title_box}{pictures}
</p:spTree></p:cSld>
<p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr>
</p:sld>"#
    )
}

const SLIDE_LAYOUT_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:sldLayout xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main" type="blank" preserve="1">
<p:cSld name="Blank"><p:spTree><p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="0" cy="0"/><a:chOff x="0" y="0"/><a:chExt cx="0" cy="0"/></a:xfrm></p:grpSpPr></p:spTree></p:cSld>
<p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr>
</p:sldLayout>"#;

const LAYOUT_RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideMaster" Target="../slideMasters/slideMaster1.xml"/>
</Relationships>"#;

const SLIDE_MASTER_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:sldMaster xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main">
<p:cSld><p:bg><p:bgRef idx="1001"><a:schemeClr val="bg1"/></p:bgRef></p:bg><p:spTree><p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="0" cy="0"/><a:chOff x="0" y="0"/><a:chExt cx="0" cy="0"/></a:xfrm></p:grpSpPr></p:spTree></p:cSld>
<p:clrMap bg1="lt1" tx1="dk1" bg2="lt2" tx2="dk2" accent1="accent1" accent2="accent2" accent3="accent3" accent4="accent4" accent5="accent5" accent6="accent6" hlink="hlink" folHlink="folHlink"/>
<p:sldLayoutIdLst><p:sldLayoutId id="2147483649" r:id="rId1"/></p:sldLayoutIdLst>
</p:sldMaster>"#;

const MASTER_RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideLayout" Target="../slideLayouts/slideLayout1.xml"/>
<Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/theme" Target="../theme/theme1.xml"/>
</Relationships>"#;

// Minimal theme: colour and font schemes plus one style per format list.
const THEME_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<a:theme xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" name="Office Theme">
<a:themeElements>
<a:clrScheme name="Office"><a:dk1><a:sysClr val="windowText" lastClr="000000"/></a:dk1><a:lt1><a:sysClr val="window" lastClr="FFFFFF"/></a:lt1><a:dk2><a:srgbClr val="2A3F5F"/></a:dk2><a:lt2><a:srgbClr val="EBF0F8"/></a:lt2><a:accent1><a:srgbClr val="1F77B4"/></a:accent1><a:accent2><a:srgbClr val="FF7F0E"/></a:accent2><a:accent3><a:srgbClr val="2CA02C"/></a:accent3><a:accent4><a:srgbClr val="D62728"/></a:accent4><a:accent5><a:srgbClr val="9467BD"/></a:accent5><a:accent6><a:srgbClr val="8C564B"/></a:accent6><a:hlink><a:srgbClr val="0563C1"/></a:hlink><a:folHlink><a:srgbClr val="954F72"/></a:folHlink></a:clrScheme>
<a:fontScheme name="Office"><a:majorFont><a:latin typeface="Calibri Light"/><a:ea typeface=""/><a:cs typeface=""/></a:majorFont><a:minorFont><a:latin typeface="Calibri"/><a:ea typeface=""/><a:cs typeface=""/></a:minorFont></a:fontScheme>
<a:fmtScheme name="Office"><a:fillStyleLst><a:solidFill><a:schemeClr val="phClr"/></a:solidFill><a:solidFill><a:schemeClr val="phClr"/></a:solidFill><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:fillStyleLst><a:lnStyleLst><a:ln w="6350"><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:ln><a:ln w="12700"><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:ln><a:ln w="19050"><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:ln></a:lnStyleLst><a:effectStyleLst><a:effectStyle><a:effectLst/></a:effectStyle><a:effectStyle><a:effectLst/></a:effectStyle><a:effectStyle><a:effectLst/></a:effectStyle></a:effectStyleLst><a:bgFillStyleLst><a:solidFill><a:schemeClr val="phClr"/></a:solidFill><a:solidFill><a:schemeClr val="phClr"/></a:solidFill><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:bgFillStyleLst></a:fmtScheme>
</a:themeElements>
<a:objectDefaults/>
<a:extraClrSchemeLst/>
</a:theme>"#;

fn core_props_xml(title: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:dcterms="http://purl.org/dc/terms/" xmlns:dcmitype="http://purl.org/dc/dcmitype/" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">
<dc:title>{title}</dc:title>
<dc:creator>{APP_NAME}</dc:creator>
<cp:lastModifiedBy>{APP_NAME}</cp:lastModifiedBy>
<cp:revision>1</cp:revision>
</cp:coreProperties>"#
    )
}

fn app_props_xml(slide_count: usize) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Properties xmlns="http://schemas.openxmlformats.org/officeDocument/2006/extended-properties" xmlns:vt="http://schemas.openxmlformats.org/officeDocument/2006/docPropsVTypes">
<Application>{APP_NAME}</Application>
<PresentationFormat>On-screen Show (16:9)</PresentationFormat>
<Slides>{slide_count}</Slides>
<Notes>0</Notes>
<HiddenSlides>0</HiddenSlides>
<ScaleCrop>false</ScaleCrop>
<LinksUpToDate>false</LinksUpToDate>
<SharedDoc>false</SharedDoc>
<HyperlinksChanged>false</HyperlinksChanged>
<AppVersion>16.0000</AppVersion>
</Properties>"#
    )
}
