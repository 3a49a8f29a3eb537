use actix_multipart::Multipart;
use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, http::StatusCode, web};
use futures_util::TryStreamExt;
use futures_util::stream::StreamExt;

use super::{current_user, respond};
use crate::middlewares;
use crate::models::{ApiResponse, ErrorCode, files::requests::UploadQuery};
use crate::services::FileService;

/// multipart 中唯一的 `file` 字段
struct UploadedFile {
    filename: String,
    data: Vec<u8>,
}

/// 读取上传内容，超出大小上限时立即停止
async fn read_single_file(
    mut payload: Multipart,
    max_size: usize,
) -> Result<UploadedFile, HttpResponse> {
    let mut uploaded: Option<UploadedFile> = None;

    while let Ok(Some(mut field)) = payload.try_next().await {
        let content_disposition = field.content_disposition();
        let name = content_disposition
            .and_then(|cd| cd.get_name())
            .unwrap_or_default()
            .to_string();

        if name != "file" {
            continue;
        }
        if uploaded.is_some() {
            return Err(HttpResponse::BadRequest().json(ApiResponse::error_empty(
                ErrorCode::MultifileUploadNotAllowed,
                "Only one file can be uploaded at a time",
            )));
        }

        let filename = content_disposition
            .and_then(|cd| cd.get_filename())
            .map(|s| s.to_string())
            .unwrap_or_default();

        let mut data = Vec::new();
        while let Some(chunk) = field.next().await {
            let chunk = chunk.map_err(|e| {
                tracing::warn!("读取上传内容失败: {}", e);
                HttpResponse::BadRequest().json(ApiResponse::error_empty(
                    ErrorCode::FileUploadFailed,
                    "Failed to read the uploaded file",
                ))
            })?;
            if data.len() + chunk.len() > max_size {
                return Err(HttpResponse::BadRequest().json(ApiResponse::error_empty(
                    ErrorCode::FileSizeExceeded,
                    "File size exceeds the limit",
                )));
            }
            data.extend_from_slice(&chunk);
        }

        uploaded = Some(UploadedFile { filename, data });
    }

    uploaded.ok_or_else(|| {
        HttpResponse::BadRequest().json(ApiResponse::error_empty(
            ErrorCode::BadRequest,
            "No file found in upload payload",
        ))
    })
}

// 上传文件
pub async fn upload_file(
    req: HttpRequest,
    service: web::Data<FileService>,
    query: web::Query<UploadQuery>,
    payload: Multipart,
) -> ActixResult<HttpResponse> {
    let user = match current_user(&req) {
        Ok(user) => user,
        Err(resp) => return Ok(resp),
    };

    let file = match read_single_file(payload, service.max_size()).await {
        Ok(file) => file,
        Err(resp) => return Ok(resp),
    };

    let result = service
        .upload(&user, query.category, &file.filename, &file.data)
        .await;
    Ok(respond("upload_file", StatusCode::CREATED, "File uploaded", result))
}

// 配置路由
pub fn configure_file_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/files")
            .wrap(middlewares::RequireJWT)
            .route("", web::post().to(upload_file)),
    );
}
