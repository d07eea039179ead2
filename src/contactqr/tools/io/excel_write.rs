use std::io::Write;
use std::path::Path;

use rust_xlsxwriter::{Format, FormatAlign, FormatBorder, Image, Workbook, Worksheet};
use tempfile::NamedTempFile;
use tracing::{debug, instrument};

use crate::contactqr::tools::error::{Result, ToolError};
use crate::contactqr::tools::model::Contact;

/// Sheet listing every contact's class and name.
pub const LIST_SHEET: &str = "List";
/// Sheet laying out labelled QR codes for printing.
pub const QR_SHEET: &str = "QR";
/// Header of the listing sheet.
pub const LIST_HEADERS: [&str; 2] = ["class", "name"];

const GRID_COLUMN_WIDTH_PX: u16 = 300;
const LABEL_ROW_HEIGHT_PX: u16 = 32;
const IMAGE_ROW_HEIGHT_PX: u16 = 220;
/// Rendered edge length of each QR image, independent of its pixel size.
const IMAGE_EDGE_PX: f64 = 200.0;
const IMAGE_OFFSET_X_PX: u32 = 50;
const IMAGE_OFFSET_Y_PX: u32 = 10;
const A4_PAPER: u8 = 9;

/// Zero based position of the label cell for the contact at `index`. The
/// image sits in the row directly below.
pub fn qr_grid_cell(index: usize) -> (u32, u16) {
    let row = (2 * (index / 2)) as u32;
    let col = (index % 2) as u16;
    (row, col)
}

/// Scale factors that render a `width` x `height` pixel image as an
/// `IMAGE_EDGE_PX` square.
pub fn image_scale(width: f64, height: f64) -> (f64, f64) {
    (IMAGE_EDGE_PX / width, IMAGE_EDGE_PX / height)
}

/// Builds the listing and QR sheets and saves them to `path`.
///
/// Nothing is written unless every cell and image was added successfully;
/// the finished file replaces `path` in a single rename.
#[instrument(level = "info", skip_all, fields(output = %path.display(), contacts = contacts.len()))]
pub fn write_workbook(path: &Path, contacts: &[Contact]) -> Result<()> {
    let mut workbook = build_workbook(contacts)?;
    let buffer = workbook.save_to_buffer()?;

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut staged = NamedTempFile::new_in(dir).map_err(|err| ToolError::write(path, err))?;
    staged
        .write_all(&buffer)
        .map_err(|err| ToolError::write(path, err))?;
    staged
        .persist(path)
        .map_err(|err| ToolError::write(path, err.error))?;

    debug!(bytes = buffer.len(), "workbook saved");
    Ok(())
}

/// Assembles the in-memory workbook without touching the destination.
pub fn build_workbook(contacts: &[Contact]) -> Result<Workbook> {
    let mut workbook = Workbook::new();

    let listing = workbook.add_worksheet();
    write_listing(listing, contacts)?;

    let grid = workbook.add_worksheet();
    write_qr_grid(grid, contacts)?;

    Ok(workbook)
}

fn write_listing(worksheet: &mut Worksheet, contacts: &[Contact]) -> Result<()> {
    worksheet.set_name(LIST_SHEET)?;
    let header = Format::new().set_bold();

    for (col_idx, title) in LIST_HEADERS.iter().enumerate() {
        worksheet.write_string_with_format(0, col_idx as u16, *title, &header)?;
    }

    for (row_idx, contact) in contacts.iter().enumerate() {
        let row = (row_idx + 1) as u32;
        worksheet.write_string(row, 0, &contact.class)?;
        worksheet.write_string(row, 1, &contact.full_name)?;
    }

    Ok(())
}

fn write_qr_grid(worksheet: &mut Worksheet, contacts: &[Contact]) -> Result<()> {
    worksheet.set_name(QR_SHEET)?;
    worksheet
        .set_paper_size(A4_PAPER)
        .set_margins(0.4, 0.4, 0.5, 0.5, 0.3, 0.3)
        .set_print_center_horizontally(true);
    for col in 0..2 {
        worksheet.set_column_width_pixels(col, GRID_COLUMN_WIDTH_PX)?;
    }

    let label_format = Format::new()
        .set_border(FormatBorder::Medium)
        .set_align(FormatAlign::Center)
        .set_align(FormatAlign::VerticalCenter)
        .set_font_size(14);
    let image_format = Format::new()
        .set_border_left(FormatBorder::Medium)
        .set_border_right(FormatBorder::Medium)
        .set_border_bottom(FormatBorder::Medium);

    for (index, contact) in contacts.iter().enumerate() {
        let (label_row, col) = qr_grid_cell(index);
        let image_row = label_row + 1;
        if col == 0 {
            worksheet.set_row_height_pixels(label_row, LABEL_ROW_HEIGHT_PX)?;
            worksheet.set_row_height_pixels(image_row, IMAGE_ROW_HEIGHT_PX)?;
        }

        let label = format!("{} {}", contact.class, contact.full_name);
        worksheet.write_string_with_format(label_row, col, &label, &label_format)?;
        worksheet.write_blank(image_row, col, &image_format)?;

        let mut image = Image::new(contact.png_path())?;
        let (scale_width, scale_height) = image_scale(image.width(), image.height());
        image
            .set_scale_width(scale_width)
            .set_scale_height(scale_height);
        worksheet.insert_image_with_offset(
            image_row,
            col,
            &image,
            IMAGE_OFFSET_X_PX,
            IMAGE_OFFSET_Y_PX,
        )?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contactqr::tools::model::ResponseStatus;
    use image::{GrayImage, Luma};
    use std::io::{Cursor, Read};
    use tempfile::tempdir;

    #[test]
    fn grid_places_two_contacts_per_row_pair() {
        assert_eq!(qr_grid_cell(0), (0, 0));
        assert_eq!(qr_grid_cell(1), (0, 1));
        assert_eq!(qr_grid_cell(2), (2, 0));
        assert_eq!(qr_grid_cell(3), (2, 1));
        assert_eq!(qr_grid_cell(4), (4, 0));
    }

    fn contact_with_png(dir: &Path, stem: &str, class: &str, size: u32) -> Contact {
        let contact = Contact {
            class: class.into(),
            full_name: stem.into(),
            vcf_path: dir.join(format!("{stem}.vcf")),
            cell_phone: String::new(),
            email: String::new(),
            response_status: ResponseStatus::Accepted,
        };
        GrayImage::from_pixel(size, size, Luma([255]))
            .save(contact.png_path())
            .expect("PNG written");
        contact
    }

    fn zip_entry(buffer: &[u8], name: &str) -> String {
        let mut archive = zip::ZipArchive::new(Cursor::new(buffer)).expect("xlsx archive");
        let mut entry = archive.by_name(name).expect("archive entry");
        let mut text = String::new();
        entry.read_to_string(&mut text).expect("entry read");
        text
    }

    fn tag_values(xml: &str, open: &str, close: &str) -> Vec<String> {
        xml.split(open)
            .skip(1)
            .filter_map(|rest| rest.split(close).next())
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn scale_renders_every_source_at_the_same_size() {
        for size in [256.0, 177.0, 512.0] {
            let (scale_width, scale_height) = image_scale(size, size);
            assert!((size * scale_width - IMAGE_EDGE_PX).abs() < 1e-9);
            assert!((size * scale_height - IMAGE_EDGE_PX).abs() < 1e-9);
        }
    }

    #[test]
    fn images_sit_below_labels_with_uniform_size() {
        let dir = tempdir().expect("temporary directory");
        let contacts = vec![
            contact_with_png(dir.path(), "a01", "1", 256),
            contact_with_png(dir.path(), "a02", "1", 177),
            contact_with_png(dir.path(), "b01", "2", 177),
        ];

        let mut workbook = build_workbook(&contacts).expect("workbook built");
        let buffer = workbook.save_to_buffer().expect("workbook serialized");

        let drawing = zip_entry(&buffer, "xl/drawings/drawing1.xml");
        let anchors: Vec<(String, String)> = tag_values(&drawing, "<xdr:from>", "</xdr:from>")
            .iter()
            .map(|from| {
                let col = tag_values(from, "<xdr:col>", "</xdr:col>").remove(0);
                let row = tag_values(from, "<xdr:row>", "</xdr:row>").remove(0);
                (col, row)
            })
            .collect();
        assert_eq!(
            anchors,
            vec![
                ("0".to_string(), "1".to_string()),
                ("1".to_string(), "1".to_string()),
                ("0".to_string(), "3".to_string()),
            ]
        );

        let extents: Vec<u64> = tag_values(&drawing, "<a:ext cx=\"", "\"")
            .iter()
            .map(|cx| cx.parse().expect("numeric extent"))
            .collect();
        assert_eq!(extents.len(), 3);
        let first = extents[0];
        // One pixel is 9525 EMU.
        assert!(extents.iter().all(|cx| cx.abs_diff(first) < 9525), "{extents:?}");

        let grid = zip_entry(&buffer, "xl/worksheets/sheet2.xml");
        assert!(grid.contains("horizontalCentered=\"1\""));
        assert!(grid.contains("paperSize=\"9\""));
    }

    #[test]
    fn missing_image_leaves_no_output() {
        let dir = tempdir().expect("temporary directory");
        let contacts = vec![Contact {
            class: "1".into(),
            full_name: "Nobody".into(),
            vcf_path: dir.path().join("nobody.vcf"),
            cell_phone: String::new(),
            email: String::new(),
            response_status: ResponseStatus::Declined,
        }];
        let output = dir.path().join("out.xlsx");

        assert!(write_workbook(&output, &contacts).is_err());
        assert!(!output.exists());
        let leftovers = std::fs::read_dir(dir.path()).expect("dir listed").count();
        assert_eq!(leftovers, 0);
    }
}
