pub mod image_file_display_sink;
