pub mod ip_info_geolocator;
