//! Single-page certificate PDF rendering
//!
//! Text fields are placed at the template's absolute coordinates using the standard
//! Helvetica fonts, so no font files are embedded. Characters outside Latin-1 print as `?`.

use coursely_core::models::{CertificateTemplate, SignaturePlacement, TemplateField, TemplateFieldKind};
use coursely_core::AppError;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};

const REGULAR_FONT: &str = "F1";
const BOLD_FONT: &str = "F2";
const SIGNATURE_XOBJECT: &str = "Sig";

/// Values substituted into a template's fields
#[derive(Debug, Clone)]
pub struct CertificateContent {
    pub recipient_name: String,
    pub course_title: String,
    pub instructor_name: String,
    pub issue_date: String,
    pub certificate_number: String,
    pub verification_code: String,
}

/// Decoded signature image, raw RGB8
#[derive(Debug, Clone)]
pub struct SignatureImage {
    pixels: Vec<u8>,
    width: u32,
    height: u32,
}

impl SignatureImage {
    pub fn decode(bytes: &[u8]) -> Result<Self, AppError> {
        let image = image::load_from_memory(bytes)
            .map_err(|e| AppError::InvalidInput(format!("Unreadable signature image: {}", e)))?
            .to_rgb8();
        let (width, height) = image.dimensions();
        Ok(Self {
            pixels: image.into_raw(),
            width,
            height,
        })
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CertificateRenderer;

impl CertificateRenderer {
    pub fn new() -> Self {
        Self
    }

    pub fn render(
        &self,
        template: &CertificateTemplate,
        content: &CertificateContent,
        signature: Option<&SignatureImage>,
    ) -> Result<Vec<u8>, AppError> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let regular_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
            "Encoding" => "WinAnsiEncoding",
        });
        let bold_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica-Bold",
            "Encoding" => "WinAnsiEncoding",
        });

        let mut operations: Vec<Operation> = template
            .fields
            .iter()
            .flat_map(|field| text_operations(field, content))
            .collect();

        let mut resources = dictionary! {
            "Font" => dictionary! {
                REGULAR_FONT => regular_id,
                BOLD_FONT => bold_id,
            },
        };

        if let (Some(image), Some(placement)) = (signature, template.signature_placement) {
            let image_id = doc.add_object(Stream::new(
                dictionary! {
                    "Type" => "XObject",
                    "Subtype" => "Image",
                    "Width" => i64::from(image.width),
                    "Height" => i64::from(image.height),
                    "ColorSpace" => "DeviceRGB",
                    "BitsPerComponent" => 8,
                },
                image.pixels.clone(),
            ));
            resources.set(
                "XObject",
                dictionary! { SIGNATURE_XOBJECT => image_id },
            );
            operations.extend(image_operations(image, &placement));
        }

        let encoded = Content { operations }
            .encode()
            .map_err(|e| AppError::Internal(format!("Failed to encode certificate content: {}", e)))?;
        let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));
        let resources_id = doc.add_object(resources);

        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
            "MediaBox" => vec![
                0.into(),
                0.into(),
                template.page_width.into(),
                template.page_height.into(),
            ],
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![page_id.into()],
                "Count" => 1,
            }),
        );

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        let info_id = doc.add_object(dictionary! {
            "Title" => Object::string_literal(pdf_text(&template.title)),
            "Subject" => Object::string_literal(pdf_text(&content.certificate_number)),
            "Producer" => Object::string_literal("Coursely"),
        });
        doc.trailer.set("Root", catalog_id);
        doc.trailer.set("Info", info_id);
        doc.compress();

        let mut buffer = Vec::new();
        doc.save_to(&mut buffer)
            .map_err(|e| AppError::Internal(format!("Failed to write certificate PDF: {}", e)))?;
        Ok(buffer)
    }
}

fn field_text(field: &TemplateField, content: &CertificateContent) -> Option<String> {
    match field.kind {
        TemplateFieldKind::RecipientName => Some(content.recipient_name.clone()),
        TemplateFieldKind::CourseTitle => Some(content.course_title.clone()),
        TemplateFieldKind::IssueDate => Some(format!("Issued on {}", content.issue_date)),
        TemplateFieldKind::CertificateNumber => {
            Some(format!("Certificate No. {}", content.certificate_number))
        }
        TemplateFieldKind::VerificationCode => {
            Some(format!("Verification code {}", content.verification_code))
        }
        TemplateFieldKind::InstructorName => Some(format!("Instructor: {}", content.instructor_name)),
        TemplateFieldKind::StaticText => field.text.clone(),
    }
}

fn text_operations(field: &TemplateField, content: &CertificateContent) -> Vec<Operation> {
    let Some(text) = field_text(field, content).filter(|t| !t.is_empty()) else {
        return Vec::new();
    };
    let font = match field.kind {
        TemplateFieldKind::RecipientName | TemplateFieldKind::CourseTitle => BOLD_FONT,
        _ => REGULAR_FONT,
    };
    vec![
        Operation::new("BT", vec![]),
        Operation::new("Tf", vec![font.into(), field.font_size.into()]),
        Operation::new("Td", vec![field.x.into(), field.y.into()]),
        Operation::new("Tj", vec![Object::string_literal(pdf_text(&text))]),
        Operation::new("ET", vec![]),
    ]
}

/// Draws the image scaled to fit inside the placement box, keeping its aspect ratio.
fn image_operations(image: &SignatureImage, placement: &SignaturePlacement) -> Vec<Operation> {
    let scale = (placement.width / image.width as f32).min(placement.height / image.height as f32);
    let width = image.width as f32 * scale;
    let height = image.height as f32 * scale;
    vec![
        Operation::new("q", vec![]),
        Operation::new(
            "cm",
            vec![
                width.into(),
                0.into(),
                0.into(),
                height.into(),
                placement.x.into(),
                placement.y.into(),
            ],
        ),
        Operation::new("Do", vec![SIGNATURE_XOBJECT.into()]),
        Operation::new("Q", vec![]),
    ]
}

/// WinAnsi-compatible bytes for the standard fonts.
fn pdf_text(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| u8::try_from(u32::from(c)).unwrap_or(b'?'))
        .collect()
}
