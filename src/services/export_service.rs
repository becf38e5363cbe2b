use crate::error::Result;
use crate::models::invoice::InvoiceStatus;
use crate::models::job::{Job, PersonType};
use crate::models::status::{JobStatus, Stage};
use rust_xlsxwriter::*;

pub const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

pub struct ExportService;

impl ExportService {
    fn status_label(status: JobStatus) -> &'static str {
        match status {
            JobStatus::Yangi => "Yangi",
            JobStatus::Bajarilmoqda => "Bajarilmoqda",
            JobStatus::AloqaUzildi => "Aloqa uzildi",
            JobStatus::Keyinroq => "Keyinroq",
            JobStatus::Rejected => "Rad etilgan",
            JobStatus::BrandInReview => "Brend tekshiruvda",
            JobStatus::Approved => "Tasdiqlangan",
            JobStatus::ReturnedToOperator => "Operatorga qaytarilgan",
            JobStatus::DocumentsPending => "Hujjatlar kutilmoqda",
            JobStatus::DocumentsSubmitted => "Hujjatlar topshirilgan",
            JobStatus::DocumentsReturned => "Hujjatlar qaytarilgan",
            JobStatus::ToLawyer => "Yuristga yuborilgan",
            JobStatus::LawyerProcessing => "Yurist ishlamoqda",
            JobStatus::LawyerCompleted => "Yurist yakunladi",
            JobStatus::Finished => "Guvohnoma topshirildi",
            JobStatus::Bajarildi => "Bajarildi",
        }
    }

    fn status_color(status: JobStatus) -> Color {
        match status.stage() {
            Stage::ClientContact => Color::RGB(0x3B82F6),      // Blue
            Stage::BrandReview | Stage::DocumentReview => Color::RGB(0xF59E0B), // Amber
            Stage::BrandCorrection | Stage::DocumentCollection => Color::RGB(0x8B5CF6), // Violet
            Stage::LawyerIntake | Stage::LawyerProcessing => Color::RGB(0x0EA5E9), // Sky
            Stage::CertificateDelivery => Color::RGB(0x10B981), // Emerald
            Stage::Closed if status == JobStatus::Rejected => Color::RGB(0xEF4444),
            Stage::Closed => Color::RGB(0x64748B),
        }
    }

    fn invoice_summary(job: &Job) -> String {
        if job.invoices.is_empty() {
            return "—".to_string();
        }
        let paid = job
            .invoices
            .iter()
            .filter(|i| i.status == InvoiceStatus::Paid)
            .count();
        format!("{}/{} to'langan", paid, job.invoices.len())
    }

    /// Generate a styled XLSX workbook from a worklist.
    pub fn generate_jobs_xlsx(jobs: &[Job], title: &str) -> Result<Vec<u8>> {
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        worksheet.set_name("Jobs")?;

        // ── Color palette ──
        let primary_color = Color::RGB(0x1E293B);     // Slate 800
        let header_bg = Color::RGB(0x0F172A);          // Slate 900
        let header_text = Color::White;
        let alt_row_1 = Color::RGB(0xF8FAFC);          // Slate 50
        let alt_row_2 = Color::White;
        let border_color = Color::RGB(0xE2E8F0);       // Slate 200

        let columns = [
            ("№",              8.0),
            ("Kod",            14.0),
            ("Mijoz",          28.0),
            ("Telefon",        18.0),
            ("Brend",          26.0),
            ("MKTU sinflari",  18.0),
            ("Holat",          24.0),
            ("Shaxs turi",     14.0),
            ("Hisob-fakturalar", 18.0),
            ("Oxirgi amal",    40.0),
            ("Yaratilgan",     18.0),
            ("Yangilangan",    18.0),
        ];

        for (i, (_, width)) in columns.iter().enumerate() {
            worksheet.set_column_width(i as u16, *width)?;
        }
        let last_col = (columns.len() - 1) as u16;

        // ── Title row ──
        let title_format = Format::new()
            .set_font_size(16)
            .set_bold()
            .set_font_color(header_text)
            .set_background_color(primary_color)
            .set_align(FormatAlign::CenterAcross)
            .set_align(FormatAlign::VerticalCenter);

        worksheet.set_row_height(0, 40)?;
        worksheet.merge_range(0, 0, 0, last_col, title, &title_format)?;

        // ── Subtitle row ──
        let subtitle_format = Format::new()
            .set_font_size(10)
            .set_italic()
            .set_font_color(Color::RGB(0x94A3B8))
            .set_background_color(primary_color)
            .set_align(FormatAlign::CenterAcross)
            .set_align(FormatAlign::VerticalCenter);

        worksheet.set_row_height(1, 22)?;
        let now = chrono::Utc::now().format("%d.%m.%Y %H:%M UTC").to_string();
        let subtitle_text = format!("Eksport sanasi: {}  •  Jami: {}", now, jobs.len());
        worksheet.merge_range(1, 0, 1, last_col, &subtitle_text, &subtitle_format)?;

        // ── Header row ──
        let header_format = Format::new()
            .set_bold()
            .set_font_size(10)
            .set_font_color(header_text)
            .set_background_color(header_bg)
            .set_align(FormatAlign::Center)
            .set_align(FormatAlign::VerticalCenter)
            .set_text_wrap()
            .set_border(FormatBorder::Thin)
            .set_border_color(border_color);

        let header_row = 2;
        worksheet.set_row_height(header_row, 30)?;
        for (i, (name, _)) in columns.iter().enumerate() {
            worksheet.write_string_with_format(header_row, i as u16, *name, &header_format)?;
        }

        // ── Data rows ──
        let data_start_row = 3;
        for (idx, job) in jobs.iter().enumerate() {
            let row = data_start_row + idx as u32;
            let bg = if idx % 2 == 0 { alt_row_1 } else { alt_row_2 };

            let base_fmt = Format::new()
                .set_font_size(10)
                .set_background_color(bg)
                .set_align(FormatAlign::VerticalCenter)
                .set_border(FormatBorder::Thin)
                .set_border_color(border_color);
            let center_fmt = base_fmt.clone().set_align(FormatAlign::Center);
            let wrap_fmt = base_fmt.clone().set_text_wrap();

            worksheet.set_row_height(row, 22)?;
            worksheet.write_number_with_format(row, 0, (idx + 1) as f64, &center_fmt)?;
            worksheet.write_string_with_format(row, 1, &job.job_id, &center_fmt)?;

            let name_fmt = base_fmt.clone().set_bold();
            worksheet.write_string_with_format(row, 2, &job.client_full_name(), &name_fmt)?;
            worksheet.write_string_with_format(row, 3, job.phone.as_deref().unwrap_or("—"), &base_fmt)?;
            worksheet.write_string_with_format(row, 4, job.brand_name.as_deref().unwrap_or("—"), &base_fmt)?;

            let classes = if job.classes.is_empty() {
                "—".to_string()
            } else {
                job.classes.iter().map(|c| c.to_string()).collect::<Vec<_>>().join(", ")
            };
            worksheet.write_string_with_format(row, 5, &classes, &center_fmt)?;

            // Status (colored)
            let status_fmt = Format::new()
                .set_font_size(10)
                .set_bold()
                .set_font_color(Color::White)
                .set_background_color(Self::status_color(job.status))
                .set_align(FormatAlign::Center)
                .set_align(FormatAlign::VerticalCenter)
                .set_border(FormatBorder::Thin)
                .set_border_color(border_color);
            worksheet.write_string_with_format(row, 6, Self::status_label(job.status), &status_fmt)?;

            let person_type = match job.person_docs.as_ref().map(|d| d.person_type()) {
                Some(PersonType::Yuridik) => "Yuridik",
                Some(PersonType::Jismoniy) => "Jismoniy",
                None => "—",
            };
            worksheet.write_string_with_format(row, 7, person_type, &center_fmt)?;
            worksheet.write_string_with_format(row, 8, &Self::invoice_summary(job), &center_fmt)?;

            let last_action = job
                .history
                .last()
                .map(|h| {
                    let when = h.at.format("%d.%m %H:%M");
                    match &h.comment {
                        Some(comment) => format!("{} {} ({}): {}", when, h.action, h.actor_role, comment),
                        None => format!("{} {} ({})", when, h.action, h.actor_role),
                    }
                })
                .unwrap_or_else(|| "—".to_string());
            worksheet.write_string_with_format(row, 9, &last_action, &wrap_fmt)?;

            worksheet.write_string_with_format(row, 10, &job.created_at.format("%d.%m.%Y %H:%M").to_string(), &center_fmt)?;
            worksheet.write_string_with_format(row, 11, &job.updated_at.format("%d.%m.%Y %H:%M").to_string(), &center_fmt)?;
        }

        // ── Summary row ──
        let total_row = data_start_row + jobs.len() as u32 + 1;
        let summary_fmt = Format::new()
            .set_bold()
            .set_font_size(10)
            .set_font_color(primary_color)
            .set_background_color(Color::RGB(0xE0E7FF))  // Indigo 100
            .set_align(FormatAlign::Center)
            .set_align(FormatAlign::VerticalCenter)
            .set_border(FormatBorder::Thin)
            .set_border_color(border_color);

        worksheet.set_row_height(total_row, 26)?;
        worksheet.merge_range(total_row, 0, total_row, 2, &format!("Jami: {} ta ish", jobs.len()), &summary_fmt)?;

        let paid = jobs.iter().filter(|j| j.is_paid()).count();
        let closed = jobs.iter().filter(|j| j.status.is_terminal()).count();
        let stats = format!("To'langan: {} | Yopilgan: {}", paid, closed);
        worksheet.merge_range(total_row, 3, total_row, last_col, &stats, &summary_fmt)?;

        // Header stays visible while scrolling
        worksheet.set_freeze_panes(3, 0)?;
        worksheet.autofilter(2, 0, (data_start_row + jobs.len() as u32).saturating_sub(1).max(2), last_col)?;

        let buffer = workbook.save_to_buffer()?;
        Ok(buffer)
    }
}
